//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements               | Connects to                  |
//! |------------|--------------------------|------------------------------|
//! | `console`  | SerialTransport          | process stdin / stdout       |
//! | `log_sink` | EventSink, `log::Log`    | LogChannel                   |
//! | `sim`      | AnalogSampler, PwmSink   | simulated photocell + LED    |
//! | `time`     | DelayNs                  | host monotonic clock         |

pub mod console;
pub mod log_sink;
pub mod sim;
pub mod time;
