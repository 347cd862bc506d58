//! Proportional / proportional-integral controller for LED duty.
//!
//! The controller works in percent: the measurement is the scaled
//! photocell level and the output is the requested LED duty.
//!
//! The integral accumulates the raw error every call and is never clamped.
//! Only the returned output is clamped, so the accumulator can wind up
//! while the output sits at a limit.

use super::shared::ControlParams;

/// PI controller.  With `ki == None` it is a pure P controller and the
/// accumulator stays at zero.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: Option<f32>,
    setpoint: f32,
    integral: f32,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    /// Proportional-integral controller.
    ///
    /// Limits are not validated.  If `output_min > output_max` every call
    /// to [`compute`](Self::compute) returns `output_min`.
    pub fn new_pi(kp: f32, ki: f32, setpoint: f32, output_min: f32, output_max: f32) -> Self {
        Self {
            kp,
            ki: Some(ki),
            setpoint,
            integral: 0.0,
            output_min,
            output_max,
        }
    }

    /// Proportional-only controller.
    pub fn new_proportional(kp: f32, setpoint: f32, output_min: f32, output_max: f32) -> Self {
        Self {
            kp,
            ki: None,
            setpoint,
            integral: 0.0,
            output_min,
            output_max,
        }
    }

    /// Compute the clamped output for one measurement.
    pub fn compute(&mut self, measured: f32) -> f32 {
        let error = self.setpoint - measured;

        let mut output = self.kp * error;
        if let Some(ki) = self.ki {
            self.integral += error;
            output += ki * self.integral;
        }

        clamp(output, self.output_min, self.output_max)
    }

    /// Take over the command-writable parameters.
    ///
    /// `params.ki` is ignored by a proportional-only controller.
    pub fn apply(&mut self, params: &ControlParams) {
        self.kp = params.kp;
        self.setpoint = params.setpoint;
        if self.ki.is_some() {
            if let Some(ki) = params.ki {
                self.ki = Some(ki);
            }
        }
    }

    pub fn set_kp(&mut self, kp: f32) {
        self.kp = kp;
    }

    /// Set the integral gain.  Returns `false` on a proportional-only
    /// controller.
    pub fn set_ki(&mut self, ki: f32) -> bool {
        match self.ki.as_mut() {
            Some(slot) => {
                *slot = ki;
                true
            }
            None => false,
        }
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Zero the integral accumulator.
    pub fn reset(&mut self) {
        self.integral = 0.0;
    }

    pub fn kp(&self) -> f32 {
        self.kp
    }

    pub fn ki(&self) -> Option<f32> {
        self.ki
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn limits(&self) -> (f32, f32) {
        (self.output_min, self.output_max)
    }
}

/// `f32::clamp` panics when `lo > hi`; a reversed range returns `lo` here.
fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi || v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}
