//! Actuator drivers.

pub mod led_pwm;

pub use led_pwm::{HalPwm, LedPwm};
