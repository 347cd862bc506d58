//! Latched fault register.
//!
//! Every degraded-but-survivable condition in the runtime sets a bit here.
//! Bits stay set until an operator clears them with `fault_clear`, so a
//! transient ADC glitch is still visible minutes later over the console.
//!
//! ## Fault lifecycle
//!
//! 1. A subsystem detects the condition and absorbs it locally (last good
//!    value kept, bytes dropped, calibration skipped).
//! 2. The control loop raises the matching [`Fault`]; the first raise is
//!    logged, repeats are silent.
//! 3. `faults` lists the latched bits, `fault_clear` resets them.
//!
//! All state is atomic so the register can be read from interrupt context
//! and shared by `&` with command handlers.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use log::{info, warn};

/// Latched fault conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// A photocell conversion failed or timed out.
    SensorRead = 0b0000_0001,
    /// Calibration was aborted or its spread was too small.
    CalibrationRejected = 0b0000_0010,
    /// The log ring was full and message bytes were dropped.
    LogOverflow = 0b0000_0100,
    /// A command line exceeded the line buffer and was truncated.
    LineOverflow = 0b0000_1000,
}

impl Fault {
    pub const ALL: [Fault; 4] = [
        Fault::SensorRead,
        Fault::CalibrationRejected,
        Fault::LogOverflow,
        Fault::LineOverflow,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Console name, as accepted by `fault_clear`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SensorRead => "sensor_read",
            Self::CalibrationRejected => "calibration",
            Self::LogOverflow => "log_overflow",
            Self::LineOverflow => "line_overflow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorRead => write!(f, "sensor read failed"),
            Self::CalibrationRejected => write!(f, "calibration rejected"),
            Self::LogOverflow => write!(f, "log buffer overflow"),
            Self::LineOverflow => write!(f, "command line overflow"),
        }
    }
}

/// Atomic latched fault bitmask plus occurrence counters.
pub struct FaultRegister {
    flags: AtomicU8,
    sensor_failures: AtomicU32,
    calibration_failures: AtomicU32,
}

impl Default for FaultRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultRegister {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            sensor_failures: AtomicU32::new(0),
            calibration_failures: AtomicU32::new(0),
        }
    }

    /// Latch `fault`.  Logs only on the clear → set edge.
    pub fn raise(&self, fault: Fault) {
        let prev = self.flags.fetch_or(fault.mask(), Ordering::AcqRel);
        match fault {
            Fault::SensorRead => {
                self.sensor_failures.fetch_add(1, Ordering::Relaxed);
            }
            Fault::CalibrationRejected => {
                self.calibration_failures.fetch_add(1, Ordering::Relaxed);
            }
            Fault::LogOverflow | Fault::LineOverflow => {}
        }
        if prev & fault.mask() == 0 {
            warn!("FAULT SET: {fault}");
        }
    }

    pub fn clear(&self, fault: Fault) {
        let prev = self.flags.fetch_and(!fault.mask(), Ordering::AcqRel);
        if prev & fault.mask() != 0 {
            info!("FAULT CLEARED: {fault}");
        }
    }

    pub fn clear_all(&self) {
        if self.flags.swap(0, Ordering::AcqRel) != 0 {
            info!("FAULT CLEARED: all");
        }
    }

    /// Current fault bitmask.
    pub fn flags(&self) -> u8 {
        self.flags.load(Ordering::Acquire)
    }

    /// True if **any** fault is latched.
    pub fn has_faults(&self) -> bool {
        self.flags() != 0
    }

    pub fn has_fault(&self, fault: Fault) -> bool {
        self.flags() & fault.mask() != 0
    }

    /// Latched faults in declaration order.
    pub fn active(&self) -> impl Iterator<Item = Fault> {
        let flags = self.flags();
        Fault::ALL.into_iter().filter(move |f| flags & f.mask() != 0)
    }

    /// Total failed conversions since boot.
    pub fn sensor_failures(&self) -> u32 {
        self.sensor_failures.load(Ordering::Relaxed)
    }

    /// Total rejected calibration runs since boot.
    pub fn calibration_failures(&self) -> u32 {
        self.calibration_failures.load(Ordering::Relaxed)
    }
}
