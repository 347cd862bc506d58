//! LightLoop runtime library.
//!
//! Photocell light-following control loop: sensor scaling and
//! calibration, PI control, PWM actuation, a serial command console and a
//! non-blocking log/telemetry channel.  Hardware is reached only through
//! the port traits in [`app::ports`]; the `adapters` module carries the
//! host implementations used by the simulation binary and the tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod faults;
pub mod logging;
pub mod sensors;
