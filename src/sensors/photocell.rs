//! Photocell (LDR voltage divider) light sensor driver.
//!
//! Reads the divider through a one-shot ADC conversion and reports either
//! a percentage between the calibrated raw bounds or the raw value
//! clipped to a byte.
//!
//! ## Failure handling
//!
//! A failed conversion is never propagated to the control loop: `read`
//! logs the failure, keeps the last good level and leaves `last_raw`
//! untouched.  The loop always gets a value.
//!
//! ## Calibration
//!
//! `calibrate` drives the LED fully on and fully off, averaging
//! [`CALIBRATION_SAMPLES`] conversions at each end after a settle delay.
//! The new bounds are applied only when the on-average exceeds the
//! off-average by more than [`CALIBRATION_MARGIN`].  It blocks for the
//! whole sequence and actuates the LED itself, so the control loop must
//! be paused while it runs.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

use crate::app::ports::AnalogSampler;
use crate::error::{CalibrationError, CalibrationPhase, SensorError};

/// Conversions averaged at each end of a calibration run.
pub const CALIBRATION_SAMPLES: u32 = 16;

/// Settle time after switching the LED during calibration.
pub const CALIBRATION_SETTLE_MS: u32 = 100;

/// Minimum raw separation between the high and low averages.
pub const CALIBRATION_MARGIN: u16 = 10;

/// Upper bound on a single conversion.
pub const ADC_TIMEOUT_MS: u32 = 10;

/// Default raw range of a 12-bit converter.
pub const DEFAULT_RAW_MIN: u16 = 0;
pub const DEFAULT_RAW_MAX: u16 = 4095;

/// Raw readings that map to 0 % and 100 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub raw_min: u16,
    pub raw_max: u16,
}

pub struct Photocell {
    scaled: bool,
    bounds: Bounds,
    last_raw: u16,
    last_level: u8,
    consecutive_failures: u32,
    timeout_ms: u32,
}

impl Photocell {
    pub fn new(scaled: bool, raw_min: u16, raw_max: u16) -> Self {
        Self {
            scaled,
            bounds: Bounds { raw_min, raw_max },
            last_raw: 0,
            last_level: 0,
            consecutive_failures: 0,
            timeout_ms: ADC_TIMEOUT_MS,
        }
    }

    /// Override the conversion poll timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Take one reading.
    ///
    /// Returns the scaled level (0–100) or the raw value clipped to 255.
    /// On a failed conversion the previous level is returned.
    pub fn read(&mut self, adc: &mut impl AnalogSampler) -> u8 {
        let raw = match adc.sample(self.timeout_ms) {
            Ok(raw) => raw,
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                error!("ADC read failed: {e}");
                return self.last_level;
            }
        };

        let level = if self.scaled {
            self.map(raw)
        } else {
            raw.min(255) as u8
        };

        self.consecutive_failures = 0;
        self.last_raw = raw;
        self.last_level = level;
        debug!(
            "Photocell read: raw={}, scaled={}, value={}",
            raw, self.scaled, level
        );
        level
    }

    /// Map a raw reading onto 0–100 between the current bounds.
    pub fn map(&self, raw: u16) -> u8 {
        let Bounds { raw_min, raw_max } = self.bounds;
        if raw <= raw_min {
            0
        } else if raw >= raw_max {
            100
        } else {
            let span = u32::from(raw_max - raw_min);
            (u32::from(raw - raw_min) * 100 / span) as u8
        }
    }

    /// Run the two-point calibration sequence.
    ///
    /// `actuate` receives a duty in percent: 100 for the high point, 0 for
    /// the low point.  The LED is left off when this returns.
    pub fn calibrate(
        &mut self,
        adc: &mut impl AnalogSampler,
        mut actuate: impl FnMut(u8),
        delay: &mut impl DelayNs,
    ) -> Result<Bounds, CalibrationError> {
        actuate(100);
        delay.delay_ms(CALIBRATION_SETTLE_MS);
        let high = self
            .average(adc)
            .map_err(|cause| CalibrationError::Sample {
                phase: CalibrationPhase::High,
                cause,
            });
        let high = match high {
            Ok(h) => h,
            Err(e) => {
                actuate(0);
                return Err(e);
            }
        };

        actuate(0);
        delay.delay_ms(CALIBRATION_SETTLE_MS);
        let low = self
            .average(adc)
            .map_err(|cause| CalibrationError::Sample {
                phase: CalibrationPhase::Low,
                cause,
            })?;

        if u32::from(high) <= u32::from(low) + u32::from(CALIBRATION_MARGIN) {
            return Err(CalibrationError::InsufficientSpread { high, low });
        }

        self.bounds = Bounds {
            raw_min: low,
            raw_max: high,
        };
        info!("Photocell calibrated: min={low}, max={high}");
        Ok(self.bounds)
    }

    fn average(&self, adc: &mut impl AnalogSampler) -> Result<u16, SensorError> {
        let mut sum: u32 = 0;
        for _ in 0..CALIBRATION_SAMPLES {
            sum += u32::from(adc.sample(self.timeout_ms)?);
        }
        Ok((sum / CALIBRATION_SAMPLES) as u16)
    }

    /// Replace the bounds directly.  Rejected unless `raw_min < raw_max`.
    pub fn set_bounds(&mut self, raw_min: u16, raw_max: u16) -> bool {
        if raw_min >= raw_max {
            return false;
        }
        self.bounds = Bounds { raw_min, raw_max };
        true
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    pub fn last_level(&self) -> u8 {
        self.last_level
    }

    /// Failed conversions since the last good one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
