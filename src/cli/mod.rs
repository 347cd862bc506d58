//! Serial command interpreter.
//!
//! ```text
//!  UART RX ──▶ LineAssembler ──▶ Args::parse ──▶ COMMANDS lookup ──▶ handler
//!                                                                       │
//!                                             reply ("...\r\n") ◀───────┘
//! ```
//!
//! The interpreter runs in the foreground between control cycles, so
//! handlers may touch shared parameters and the actuator directly.

pub mod args;
pub mod commands;
pub mod line;

pub use args::{Args, MAX_ARGS};
pub use commands::{COMMANDS, Command, CommandContext, Dispatch, LoopStatus, dispatch};
pub use line::{DefaultHandler, LINE_BUFFER_SIZE, Line, LineAssembler, LineHandler, LineState};
