//! Host time adapter.
//!
//! Monotonic uptime plus an `embedded-hal` [`DelayNs`] backed by
//! `std::thread::sleep`, for the simulation binary.  On a board the same
//! role is filled by the HAL's timer delay.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

pub struct HostClock {
    start: Instant,
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since construction (monotonic).
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl DelayNs for HostClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
