//! Outbound control-loop events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The serial adapter turns
//! telemetry into `telemetry,<lux>,<duty>` lines and the rest into log
//! messages.

use crate::error::CalibrationError;
use crate::sensors::Bounds;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopEvent {
    /// Periodic measurement/actuation snapshot.
    Telemetry(TelemetryData),

    /// The loop began driving the LED.
    Enabled,

    /// The loop stopped driving the LED.
    Disabled,

    /// Calibration finished and the new bounds are in use.
    Calibrated(Bounds),

    /// Calibration failed; the previous bounds are kept.
    CalibrationFailed(CalibrationError),
}

/// A point-in-time telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub lux: u8,
    pub duty: u8,
    pub output: f32,
    pub tick: u64,
}
