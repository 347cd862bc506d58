//! Unified error types for the light-loop runtime.
//!
//! A single `Error` enum every subsystem converts into, keeping start-up
//! error handling uniform.  All variants are `Copy` so they can be passed
//! through the control loop and the fault register without allocation.
//!
//! Nothing on the per-cycle path is fatal: sample failures are absorbed
//! where they occur and only reported.  `Error` surfaces from
//! configuration validation and from explicit calibration runs.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the runtime funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A calibration run was aborted or rejected.
    Calibration(CalibrationError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The conversion could not be started.
    StartFailed,
    /// The conversion did not finish within the poll timeout.
    Timeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "ADC start failed"),
            Self::Timeout => write!(f, "ADC conversion timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// Which half of the calibration sequence a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    High,
    Low,
}

impl fmt::Display for CalibrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// A sample failed mid-sequence; nothing was applied.
    Sample {
        phase: CalibrationPhase,
        cause: SensorError,
    },
    /// High and low averages are too close (or inverted).
    InsufficientSpread { high: u16, low: u16 },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample { phase, cause } => {
                write!(f, "ADC read failed during {phase} calibration ({cause})")
            }
            Self::InsufficientSpread { high, low } => {
                write!(f, "insufficient spread (high={high}, low={low})")
            }
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
