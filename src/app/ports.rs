//! Port traits: the boundary between the control runtime and hardware.
//!
//! ```text
//!   ADC / PWM / UART driver ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Board drivers implement these traits.  The runtime consumes them via
//! generics, so the domain core never touches registers directly and runs
//! unchanged against the mocks in `tests/` and the host simulation.

use log::LevelFilter;

use super::events::LoopEvent;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Analog sampler (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One-shot analog conversion, modelled on a start / poll / fetch HAL.
pub trait AnalogSampler {
    /// Start one conversion.
    fn start(&mut self) -> Result<(), SensorError>;

    /// Block until the conversion finishes or `timeout_ms` elapses.
    fn poll_for_result(&mut self, timeout_ms: u32) -> Result<(), SensorError>;

    /// Result of the last finished conversion at device resolution.
    fn value(&mut self) -> u16;

    /// Start, poll and fetch in one call.
    fn sample(&mut self, timeout_ms: u32) -> Result<u16, SensorError> {
        self.start()?;
        self.poll_for_result(timeout_ms)?;
        Ok(self.value())
    }
}

// ───────────────────────────────────────────────────────────────
// PWM sink (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Timer compare output.  Writes cannot fail.
pub trait PwmSink {
    fn set_compare(&mut self, channel: u32, value: u32);

    /// Start driving the output pin.
    fn enable(&mut self, channel: u32);

    /// Stop driving the output pin.
    fn disable(&mut self, channel: u32);
}

// ───────────────────────────────────────────────────────────────
// Serial transport (driven adapter: domain ↔ UART)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented serial link with non-blocking send and receive.
///
/// Transmit completion is reported back by the UART interrupt through
/// [`LogChannel::on_transmit_complete`](crate::logging::LogChannel::on_transmit_complete).
pub trait SerialTransport {
    /// Hand `bytes` to the transmitter.  Returns how many were accepted
    /// (possibly 0 while the peripheral is busy).
    fn send_nonblocking(&mut self, bytes: &[u8]) -> usize;

    /// Next received byte, if any.
    fn receive_nonblocking(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (what command handlers may touch)
// ───────────────────────────────────────────────────────────────

/// Duty-level view of the LED actuator.
pub trait ActuatorPort {
    /// Set duty in percent; out-of-range values are clamped.
    fn set_duty(&mut self, percent: u8);

    /// Current duty in percent.
    fn duty(&self) -> u8;

    fn start(&mut self);

    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driving adapter: domain → outside world)
// ───────────────────────────────────────────────────────────────

/// Outbound structured events from the control loop.
pub trait EventSink {
    fn emit(&mut self, event: &LoopEvent);

    /// Output lost to backpressure since start.
    fn dropped_bytes(&self) -> u32 {
        0
    }
}

// ───────────────────────────────────────────────────────────────
// Log control (what `log_level` may touch)
// ───────────────────────────────────────────────────────────────

/// Runtime access to the log threshold.
pub trait LogControl {
    fn level(&self) -> LevelFilter;

    fn set_level(&self, level: LevelFilter);
}
