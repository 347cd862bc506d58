//! Simulated plant for host runs and tests.
//!
//! A photocell looking at a mix of ambient light and the LED it controls:
//!
//! ```text
//!   raw = ambient + led_gain * compare / timer_top + noise      (clipped to 0..=4095)
//! ```
//!
//! Ambient light drifts slowly so the loop has something to follow.
//! [`SimAdc`] and [`SimPwm`] share one [`Plant`] through `Rc<RefCell<_>>`;
//! the simulation is single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::ports::{AnalogSampler, PwmSink};
use crate::error::SensorError;
use crate::sensors::photocell::DEFAULT_RAW_MAX;

#[derive(Debug, Clone, Copy)]
pub struct PlantConfig {
    /// Mean ambient level in raw counts.
    pub ambient: f32,
    /// Peak-to-mean ambient swing in raw counts.
    pub ambient_swing: f32,
    /// Samples per full ambient cycle (0 = constant).
    pub ambient_period: u32,
    /// Raw counts added by the LED at full duty.
    pub led_gain: f32,
    /// Peak noise in raw counts.
    pub noise: u16,
    /// Compare value for 100 % duty.
    pub timer_top: u32,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            ambient: 900.0,
            ambient_swing: 600.0,
            ambient_period: 400,
            led_gain: 2600.0,
            noise: 12,
            timer_top: 100,
        }
    }
}

pub struct Plant {
    config: PlantConfig,
    compare: u32,
    led_on: bool,
    samples: u32,
    rng: u32,
}

impl Plant {
    pub fn new(config: PlantConfig) -> Self {
        Self {
            config,
            compare: 0,
            led_on: false,
            samples: 0,
            rng: 0x2545_f491,
        }
    }

    pub fn shared(config: PlantConfig) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(config)))
    }

    /// Current ambient contribution in raw counts.
    pub fn ambient(&self) -> f32 {
        let c = &self.config;
        if c.ambient_period == 0 {
            return c.ambient;
        }
        let phase = (self.samples % c.ambient_period) as f32 / c.ambient_period as f32;
        c.ambient + c.ambient_swing * (phase * core::f32::consts::TAU).sin()
    }

    /// LED contribution in raw counts.
    pub fn led(&self) -> f32 {
        if !self.led_on || self.config.timer_top == 0 {
            return 0.0;
        }
        self.config.led_gain * self.compare as f32 / self.config.timer_top as f32
    }

    /// One raw reading; advances the ambient drift.
    pub fn sample(&mut self) -> u16 {
        self.samples = self.samples.wrapping_add(1);
        let noise = self.noise();
        let raw = self.ambient() + self.led() + noise;
        raw.clamp(0.0, f32::from(DEFAULT_RAW_MAX)) as u16
    }

    pub fn compare(&self) -> u32 {
        self.compare
    }

    pub fn is_led_on(&self) -> bool {
        self.led_on
    }

    /// xorshift32, uniform in `-noise..=noise`.
    fn noise(&mut self) -> f32 {
        let amp = u32::from(self.config.noise);
        if amp == 0 {
            return 0.0;
        }
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x % (2 * amp + 1)) as f32 - amp as f32
    }
}

// ── ADC ───────────────────────────────────────────────────────

pub struct SimAdc {
    plant: Rc<RefCell<Plant>>,
    /// Fail every Nth conversion (0 = never).
    fail_every: u32,
    conversions: u32,
    pending: bool,
    value: u16,
}

impl SimAdc {
    pub fn new(plant: Rc<RefCell<Plant>>) -> Self {
        Self {
            plant,
            fail_every: 0,
            conversions: 0,
            pending: false,
            value: 0,
        }
    }

    /// Time out every `n`th conversion.
    pub fn with_failures(mut self, n: u32) -> Self {
        self.fail_every = n;
        self
    }
}

impl AnalogSampler for SimAdc {
    fn start(&mut self) -> Result<(), SensorError> {
        self.conversions = self.conversions.wrapping_add(1);
        self.pending = true;
        Ok(())
    }

    fn poll_for_result(&mut self, _timeout_ms: u32) -> Result<(), SensorError> {
        if !self.pending {
            return Err(SensorError::StartFailed);
        }
        self.pending = false;
        if self.fail_every > 0 && self.conversions % self.fail_every == 0 {
            return Err(SensorError::Timeout);
        }
        self.value = self.plant.borrow_mut().sample();
        Ok(())
    }

    fn value(&mut self) -> u16 {
        self.value
    }
}

// ── PWM ───────────────────────────────────────────────────────

pub struct SimPwm {
    plant: Rc<RefCell<Plant>>,
}

impl SimPwm {
    pub fn new(plant: Rc<RefCell<Plant>>) -> Self {
        Self { plant }
    }
}

impl PwmSink for SimPwm {
    fn set_compare(&mut self, _channel: u32, value: u32) {
        self.plant.borrow_mut().compare = value;
    }

    fn enable(&mut self, _channel: u32) {
        self.plant.borrow_mut().led_on = true;
    }

    fn disable(&mut self, _channel: u32) {
        self.plant.borrow_mut().led_on = false;
    }
}
