//! Closed-loop control: the PI controller and the parameter block the
//! command interpreter writes into.

pub mod pid;
pub mod shared;
