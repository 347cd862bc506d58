//! PWM LED driver.
//!
//! Converts a duty request in percent into a timer compare value:
//! `compare = duty * timer_top / duty_max`.  The driver is write-only;
//! every request is clamped, nothing can fail.
//!
//! ## Dual-target design
//!
//! The compare register sits behind the [`PwmSink`] port.  On a board it
//! is a timer channel (see [`HalPwm`] for any `embedded-hal` PWM pin); on
//! host/test it is a recording mock or the simulated plant.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::ports::{ActuatorPort, PwmSink};

/// Highest duty request, in percent.
pub const LED_PWM_MAX_DUTY: u8 = 100;

/// Default timer period (compare value for 100 %).
pub const LED_PWM_TIMER_TOP: u32 = 100;

pub struct LedPwm<P> {
    pwm: P,
    channel: u32,
    duty: u8,
    duty_max: u8,
    timer_top: u32,
    compare: u32,
    running: bool,
}

impl<P: PwmSink> LedPwm<P> {
    /// Wrap a PWM channel.  Output starts disabled at duty 0.
    pub fn new(pwm: P, channel: u32, timer_top: u32) -> Self {
        Self {
            pwm,
            channel,
            duty: 0,
            duty_max: LED_PWM_MAX_DUTY,
            timer_top,
            compare: 0,
            running: false,
        }
    }

    /// Clamp `percent` to `[0, duty_max]` and write the compare value.
    pub fn set_duty(&mut self, percent: u8) {
        let duty = percent.min(self.duty_max);
        let compare = compare_for(duty, self.duty_max, self.timer_top);
        self.pwm.set_compare(self.channel, compare);

        self.duty = duty;
        self.compare = compare;
        debug!("LED PWM duty cycle set to {}% (pulse: {})", duty, compare);
    }

    /// Enable the output.  No-op when already running.
    pub fn start(&mut self) {
        if !self.running {
            self.pwm.enable(self.channel);
            self.running = true;
            debug!("LED PWM started on channel {}", self.channel);
        }
    }

    /// Disable the output.  No-op when already stopped.
    pub fn stop(&mut self) {
        if self.running {
            self.pwm.disable(self.channel);
            self.running = false;
            debug!("LED PWM stopped on channel {}", self.channel);
        }
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn duty_max(&self) -> u8 {
        self.duty_max
    }

    /// Last compare value written.
    pub fn compare(&self) -> u32 {
        self.compare
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Borrow the underlying sink (tests / simulation).
    pub fn sink(&self) -> &P {
        &self.pwm
    }
}

impl<P: PwmSink> ActuatorPort for LedPwm<P> {
    fn set_duty(&mut self, percent: u8) {
        LedPwm::set_duty(self, percent);
    }

    fn duty(&self) -> u8 {
        self.duty
    }

    fn start(&mut self) {
        LedPwm::start(self);
    }

    fn stop(&mut self) {
        LedPwm::stop(self);
    }
}

// ── embedded-hal adapter ──────────────────────────────────────

/// [`PwmSink`] over any `embedded-hal` PWM pin.
///
/// The compare value is clipped to the pin's `max_duty_cycle`.  HAL pins
/// have no enable switch, so a disabled channel is held at duty 0 and the
/// last compare is restored on enable.  HAL write errors are dropped: the
/// sink is write-only by contract.
pub struct HalPwm<T> {
    pin: T,
    compare: u16,
    enabled: bool,
}

impl<T: SetDutyCycle> HalPwm<T> {
    pub fn new(pin: T) -> Self {
        Self {
            pin,
            compare: 0,
            enabled: false,
        }
    }

    pub fn into_inner(self) -> T {
        self.pin
    }
}

impl<T: SetDutyCycle> PwmSink for HalPwm<T> {
    fn set_compare(&mut self, _channel: u32, value: u32) {
        let max = self.pin.max_duty_cycle();
        self.compare = value.min(u32::from(max)) as u16;
        if self.enabled {
            let _ = self.pin.set_duty_cycle(self.compare);
        }
    }

    fn enable(&mut self, _channel: u32) {
        self.enabled = true;
        let _ = self.pin.set_duty_cycle(self.compare);
    }

    fn disable(&mut self, _channel: u32) {
        self.enabled = false;
        let _ = self.pin.set_duty_cycle_fully_off();
    }
}

/// `duty * top / max` in 64-bit so a full 32-bit timer top cannot overflow.
fn compare_for(duty: u8, duty_max: u8, timer_top: u32) -> u32 {
    let compare = u64::from(duty) * u64::from(timer_top) / u64::from(duty_max);
    u32::try_from(compare).unwrap_or(timer_top)
}
