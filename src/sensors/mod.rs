//! Sensor drivers.
//!
//! Only the photocell feeds the loop; it reads through the
//! [`AnalogSampler`](crate::app::ports::AnalogSampler) port.

pub mod photocell;

pub use photocell::{Bounds, Photocell};
