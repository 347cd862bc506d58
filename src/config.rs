//! Loop configuration parameters
//!
//! All tunable parameters for the light-following loop.  Values are
//! compiled-in defaults; the host binary can override them from a JSON
//! file.  Nothing is persisted.

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::control::pid::PidController;
use crate::control::shared::ControlParams;
use crate::drivers::led_pwm::LED_PWM_TIMER_TOP;
use crate::error::{Error, Result};
use crate::logging::TxMode;
use crate::sensors::photocell::{ADC_TIMEOUT_MS, DEFAULT_RAW_MAX, DEFAULT_RAW_MIN};

/// Core loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    // --- Controller ---
    /// Proportional gain
    pub kp: f32,
    /// Integral gain; `null` builds a proportional-only controller
    pub ki: Option<f32>,
    /// Target light level (0-100%)
    pub setpoint: f32,
    /// Controller output clamp
    pub output_min: f32,
    pub output_max: f32,
    /// Drive the LED from the first cycle instead of waiting for `pid_start`
    pub start_enabled: bool,

    // --- Sensor ---
    /// Map readings to 0-100% using the calibrated bounds
    pub scaled: bool,
    pub raw_min: u16,
    pub raw_max: u16,
    /// ADC conversion poll timeout (milliseconds)
    pub adc_timeout_ms: u32,
    /// Run calibration once before the first cycle
    pub calibrate_on_start: bool,

    // --- Actuator ---
    /// PWM timer compare value for 100% duty
    pub pwm_timer_top: u32,
    pub pwm_channel: u32,

    // --- Timing ---
    /// Control period (milliseconds)
    pub control_period_ms: u32,
    /// Emit a telemetry line every N cycles (0 = never)
    pub telemetry_every: u32,

    // --- Logging ---
    pub log_level: LevelFilter,
    pub tx_mode: TxMode,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            // Controller
            kp: 1.0,
            ki: Some(0.05),
            setpoint: 50.0,
            output_min: 0.0,
            output_max: 100.0,
            start_enabled: false,

            // Sensor
            scaled: true,
            raw_min: DEFAULT_RAW_MIN,
            raw_max: DEFAULT_RAW_MAX,
            adc_timeout_ms: ADC_TIMEOUT_MS,
            calibrate_on_start: true,

            // Actuator
            pwm_timer_top: LED_PWM_TIMER_TOP,
            pwm_channel: 1,

            // Timing
            control_period_ms: 50, // 20 Hz
            telemetry_every: 10,   // 2 Hz

            // Logging
            log_level: LevelFilter::Info,
            tx_mode: TxMode::Interrupt,
        }
    }
}

impl LoopConfig {
    /// Reject values the runtime cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if !self.kp.is_finite() {
            return Err(Error::Config("kp must be finite"));
        }
        if self.ki.is_some_and(|ki| !ki.is_finite()) {
            return Err(Error::Config("ki must be finite"));
        }
        if !(0.0..=100.0).contains(&self.setpoint) {
            return Err(Error::Config("setpoint must be within 0-100"));
        }
        if !self.output_min.is_finite() || !self.output_max.is_finite() {
            return Err(Error::Config("output limits must be finite"));
        }
        if self.output_min > self.output_max {
            return Err(Error::Config("output_min must not exceed output_max"));
        }
        if self.raw_min >= self.raw_max {
            return Err(Error::Config("raw_min must be below raw_max"));
        }
        if self.pwm_timer_top == 0 {
            return Err(Error::Config("pwm_timer_top must be non-zero"));
        }
        if self.control_period_ms == 0 {
            return Err(Error::Config("control_period_ms must be non-zero"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.  Missing fields keep their
    /// defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON configuration"))?;
        config.validate()?;
        Ok(config)
    }

    /// Initial contents of the shared parameter block.
    pub fn control_params(&self) -> ControlParams {
        ControlParams {
            kp: self.kp,
            ki: self.ki,
            setpoint: self.setpoint,
            enabled: self.start_enabled,
            calibrate_requested: false,
        }
    }

    pub fn build_controller(&self) -> PidController {
        match self.ki {
            Some(ki) => PidController::new_pi(
                self.kp,
                ki,
                self.setpoint,
                self.output_min,
                self.output_max,
            ),
            None => PidController::new_proportional(
                self.kp,
                self.setpoint,
                self.output_min,
                self.output_max,
            ),
        }
    }
}
