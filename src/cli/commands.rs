//! Console command table.
//!
//! Each entry maps a case-sensitive name to a handler.  Handlers validate
//! their own arguments and write a `\r\n`-terminated reply; a malformed
//! request replies with usage or an error message and changes nothing.
//!
//! | Command          | Effect                                      |
//! |------------------|---------------------------------------------|
//! | `help`           | list command names                          |
//! | `echo <args..>`  | print arguments back                        |
//! | `add <a> <b>`    | integer sum                                 |
//! | `pid_start`      | enable the loop                             |
//! | `pid_stop`       | disable the loop, LED duty 0                |
//! | `kp <v>`         | proportional gain                           |
//! | `ki <v>`         | integral gain (PI loops only)               |
//! | `sp <v>`         | setpoint, 0–100                             |
//! | `status`         | one-line controller snapshot                |
//! | `faults`         | latched faults and counters                 |
//! | `fault_clear [n]`| clear one fault or all                      |
//! | `calibrate`      | run calibration before the next cycle       |
//! | `log_level [l]`  | show or set the log threshold               |

use core::fmt;
use core::str::FromStr;

use log::{LevelFilter, warn};

use super::args::{Args, MAX_ARGS};
use crate::app::ports::{ActuatorPort, LogControl};
use crate::control::shared::SharedParams;
use crate::faults::{Fault, FaultRegister};
use crate::sensors::Bounds;

/// Measurements owned by the loop, captured before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopStatus {
    pub lux: u8,
    pub bounds: Bounds,
    pub ticks: u64,
}

/// Everything a handler may read or change.
pub struct CommandContext<'a> {
    pub params: &'a SharedParams,
    pub faults: &'a FaultRegister,
    pub actuator: &'a mut dyn ActuatorPort,
    pub log: &'a dyn LogControl,
    pub status: LoopStatus,
    pub out: &'a mut dyn fmt::Write,
}

impl CommandContext<'_> {
    /// Write one reply line.  Output is best-effort.
    pub fn reply(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(args);
        let _ = self.out.write_str("\r\n");
    }
}

pub type Handler = fn(&Args<'_>, &mut CommandContext<'_>);

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub handler: Handler,
}

/// Outcome of [`dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank line; nothing ran.
    Empty,
    Handled(&'static str),
    Unknown,
}

pub static COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "help",
        handler: cmd_help,
    },
    Command {
        name: "echo",
        usage: "echo <args...>",
        handler: cmd_echo,
    },
    Command {
        name: "add",
        usage: "add <a> <b>",
        handler: cmd_add,
    },
    Command {
        name: "pid_start",
        usage: "pid_start",
        handler: cmd_pid_start,
    },
    Command {
        name: "pid_stop",
        usage: "pid_stop",
        handler: cmd_pid_stop,
    },
    Command {
        name: "kp",
        usage: "kp <value>",
        handler: cmd_kp,
    },
    Command {
        name: "ki",
        usage: "ki <value>",
        handler: cmd_ki,
    },
    Command {
        name: "sp",
        usage: "sp <value>",
        handler: cmd_sp,
    },
    Command {
        name: "status",
        usage: "status",
        handler: cmd_status,
    },
    Command {
        name: "faults",
        usage: "faults",
        handler: cmd_faults,
    },
    Command {
        name: "fault_clear",
        usage: "fault_clear [name]",
        handler: cmd_fault_clear,
    },
    Command {
        name: "calibrate",
        usage: "calibrate",
        handler: cmd_calibrate,
    },
    Command {
        name: "log_level",
        usage: "log_level [off|error|warn|info|debug|trace]",
        handler: cmd_log_level,
    },
];

pub fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Tokenize `line` and run the matching handler.
pub fn dispatch(line: &str, ctx: &mut CommandContext<'_>) -> Dispatch {
    let args = Args::parse(line);
    let Some(name) = args.name() else {
        return Dispatch::Empty;
    };
    if args.overflowed() {
        warn!("{name}: tokens beyond the first {MAX_ARGS} ignored");
    }
    match find(name) {
        Some(cmd) => {
            (cmd.handler)(&args, ctx);
            Dispatch::Handled(cmd.name)
        }
        None => {
            ctx.reply(format_args!("Unknown command: {}", name));
            Dispatch::Unknown
        }
    }
}

// ── Argument helpers ──────────────────────────────────────────

/// The single argument of a one-argument command, or a usage reply.
fn single_arg<'a>(args: &Args<'a>, usage: &str, ctx: &mut CommandContext<'_>) -> Option<&'a str> {
    if args.argc() != 2 {
        ctx.reply(format_args!("Usage: {}", usage));
        return None;
    }
    args.get(1)
}

fn parse_gain(text: &str, ctx: &mut CommandContext<'_>) -> Option<f32> {
    match text.parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            ctx.reply(format_args!("Error: Invalid number format"));
            None
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────

fn cmd_help(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    ctx.reply(format_args!("Available commands:"));
    for cmd in COMMANDS {
        ctx.reply(format_args!("  {}", cmd.name));
    }
}

fn cmd_echo(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    for (i, word) in args.rest().iter().enumerate() {
        if i > 0 {
            let _ = ctx.out.write_str(" ");
        }
        let _ = ctx.out.write_str(word);
    }
    let _ = ctx.out.write_str("\r\n");
}

fn cmd_add(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    if args.argc() != 3 {
        ctx.reply(format_args!("Usage: add <a> <b>"));
        return;
    }
    let a = args.get(1).and_then(|s| s.parse::<i32>().ok());
    let b = args.get(2).and_then(|s| s.parse::<i32>().ok());
    match (a, b) {
        (Some(a), Some(b)) => ctx.reply(format_args!("Sum: {}", i64::from(a) + i64::from(b))),
        _ => ctx.reply(format_args!("Error: Invalid number format")),
    }
}

fn cmd_pid_start(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    ctx.params.set_enabled(true);
    ctx.actuator.start();
    ctx.reply(format_args!("PID started"));
}

fn cmd_pid_stop(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    ctx.params.set_enabled(false);
    ctx.actuator.set_duty(0);
    ctx.reply(format_args!("PID stopped"));
}

fn cmd_kp(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    let Some(text) = single_arg(args, "kp <value>", ctx) else {
        return;
    };
    if let Some(kp) = parse_gain(text, ctx) {
        ctx.params.set_kp(kp);
        ctx.reply(format_args!("OK"));
    }
}

fn cmd_ki(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    let Some(text) = single_arg(args, "ki <value>", ctx) else {
        return;
    };
    let Some(ki) = parse_gain(text, ctx) else {
        return;
    };
    if ctx.params.set_ki(ki) {
        ctx.reply(format_args!("OK"));
    } else {
        ctx.reply(format_args!("Error: Controller has no integral term"));
    }
}

fn cmd_sp(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    let Some(text) = single_arg(args, "sp <value>", ctx) else {
        return;
    };
    let Ok(sp) = text.parse::<f32>() else {
        ctx.reply(format_args!("Error: Invalid number format"));
        return;
    };
    if !(0.0..=100.0).contains(&sp) {
        ctx.reply(format_args!("Error: Value out of range (0.0 - 100.0)"));
        return;
    }
    ctx.params.set_setpoint(sp);
    ctx.reply(format_args!("OK"));
}

/// `ki` printed as `-` on a proportional-only loop.
struct Gain(Option<f32>);

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.3}", v),
            None => f.write_str("-"),
        }
    }
}

fn cmd_status(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    let p = ctx.params.snapshot();
    let s = ctx.status;
    let duty = ctx.actuator.duty();
    let faults = ctx.faults.flags();
    ctx.reply(format_args!(
        "enabled={} kp={:.3} ki={} sp={:.1} lux={} duty={} raw={}..{} ticks={} faults=0b{:08b}",
        u8::from(p.enabled),
        p.kp,
        Gain(p.ki),
        p.setpoint,
        s.lux,
        duty,
        s.bounds.raw_min,
        s.bounds.raw_max,
        s.ticks,
        faults,
    ));
}

fn cmd_faults(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    let faults = ctx.faults;
    if faults.has_faults() {
        for fault in faults.active() {
            ctx.reply(format_args!("  {}: {}", fault.name(), fault));
        }
    } else {
        ctx.reply(format_args!("No faults"));
    }
    ctx.reply(format_args!(
        "sensor_failures={} calibration_failures={}",
        faults.sensor_failures(),
        faults.calibration_failures(),
    ));
}

fn cmd_fault_clear(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    match args.argc() {
        1 => {
            ctx.faults.clear_all();
            ctx.reply(format_args!("OK"));
        }
        2 => match args.get(1).and_then(Fault::from_name) {
            Some(fault) => {
                ctx.faults.clear(fault);
                ctx.reply(format_args!("OK"));
            }
            None => ctx.reply(format_args!("Error: Unknown fault")),
        },
        _ => ctx.reply(format_args!("Usage: fault_clear [name]")),
    }
}

fn cmd_calibrate(_args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    ctx.params.request_calibration();
    ctx.reply(format_args!("Calibration scheduled"));
}

fn cmd_log_level(args: &Args<'_>, ctx: &mut CommandContext<'_>) {
    match args.argc() {
        1 => {
            let level = ctx.log.level();
            ctx.reply(format_args!("Log level: {}", level));
        }
        2 => match args.get(1).map(LevelFilter::from_str) {
            Some(Ok(level)) => {
                ctx.log.set_level(level);
                ctx.reply(format_args!("OK"));
            }
            _ => ctx.reply(format_args!("Error: Unknown level")),
        },
        _ => ctx.reply(format_args!("Usage: log_level [level]")),
    }
}
