//! Controller parameters shared between the command interpreter and the
//! control loop.
//!
//! Command handlers write a new [`ControlParams`] value; the control loop
//! takes one snapshot at the start of each cycle and applies it to the
//! controller.  The value lives behind a critical-section mutex, so a
//! reader never observes a half-written float even when the writer runs in
//! interrupt context.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// The command-writable subset of the controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParams {
    pub kp: f32,
    /// `None` for a proportional-only controller.
    pub ki: Option<f32>,
    pub setpoint: f32,
    /// Whether the loop drives the LED.
    pub enabled: bool,
    /// Set by the `calibrate` command, cleared once the loop has run it.
    pub calibrate_requested: bool,
}

/// Single-cell parameter block, safe to share by `&` across contexts.
pub struct SharedParams {
    inner: Mutex<CriticalSectionRawMutex, Cell<ControlParams>>,
}

impl SharedParams {
    pub const fn new(params: ControlParams) -> Self {
        Self {
            inner: Mutex::new(Cell::new(params)),
        }
    }

    /// Consistent copy of every field.
    pub fn snapshot(&self) -> ControlParams {
        self.inner.lock(Cell::get)
    }

    /// Read-modify-write under one critical section.
    pub fn update(&self, f: impl FnOnce(&mut ControlParams)) {
        self.inner.lock(|cell| {
            let mut p = cell.get();
            f(&mut p);
            cell.set(p);
        });
    }

    pub fn set_kp(&self, kp: f32) {
        self.update(|p| p.kp = kp);
    }

    pub fn set_setpoint(&self, setpoint: f32) {
        self.update(|p| p.setpoint = setpoint);
    }

    /// Returns `false` (and changes nothing) on a proportional-only loop.
    pub fn set_ki(&self, ki: f32) -> bool {
        let mut applied = false;
        self.update(|p| {
            if p.ki.is_some() {
                p.ki = Some(ki);
                applied = true;
            }
        });
        applied
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.update(|p| p.enabled = enabled);
    }

    pub fn request_calibration(&self) {
        self.update(|p| p.calibrate_requested = true);
    }

    /// Clear and return the calibration request flag.
    pub fn take_calibration_request(&self) -> bool {
        let mut requested = false;
        self.update(|p| {
            requested = p.calibrate_requested;
            p.calibrate_requested = false;
        });
        requested
    }
}
