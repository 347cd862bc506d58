//! Application core: the control runtime, zero register access.
//!
//! This module contains the orchestration for the light-following loop:
//! parameter snapshots, sensor → controller → actuator cycles, calibration
//! requests and console command handling.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
