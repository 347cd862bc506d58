//! Control loop service: the hexagonal core.
//!
//! [`ControlLoop`] owns the photocell state, the controller and the console
//! line assembler.  Hardware is injected at each call site through the port
//! traits, and the parameter block and fault register are shared by `&`
//! with whatever else runs on the board.
//!
//! ```text
//!  AnalogSampler ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                    │       ControlLoop         │
//!  ActuatorPort  ◀── │ Photocell · PI · Console  │ ◀── SerialTransport (RX)
//!                    └────────────┬─────────────┘
//!                                 │ snapshot once per cycle
//!                          SharedParams / FaultRegister
//! ```
//!
//! One foreground iteration is: [`poll_commands`](ControlLoop::poll_commands)
//! → [`tick`](ControlLoop::tick) → drain the log channel → wait one period.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::cli::{self, CommandContext, Dispatch, LINE_BUFFER_SIZE, Line, LineAssembler, LoopStatus};
use crate::config::LoopConfig;
use crate::control::pid::PidController;
use crate::control::shared::SharedParams;
use crate::error::Result;
use crate::faults::{Fault, FaultRegister};
use crate::sensors::{Bounds, Photocell};

use super::events::{LoopEvent, TelemetryData};
use super::ports::{ActuatorPort, AnalogSampler, EventSink, LogControl, SerialTransport};

/// What one active cycle measured and commanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub lux: u8,
    pub output: f32,
    pub duty: u8,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop<'a> {
    params: &'a SharedParams,
    faults: &'a FaultRegister,
    photocell: Photocell,
    pid: PidController,
    lines: LineAssembler<LINE_BUFFER_SIZE>,
    period_ms: u32,
    /// Telemetry every N active cycles (0 = off).
    telemetry_every: u32,
    tick_count: u64,
    /// `enabled` as of the previous cycle, for edge detection.
    enabled: bool,
    /// Sink drop count already reported.
    dropped_seen: u32,
}

impl<'a> ControlLoop<'a> {
    /// Build the loop from configuration.  Does not touch hardware.
    pub fn new(config: &LoopConfig, params: &'a SharedParams, faults: &'a FaultRegister) -> Self {
        let photocell = Photocell::new(config.scaled, config.raw_min, config.raw_max)
            .with_timeout_ms(config.adc_timeout_ms);
        Self {
            params,
            faults,
            photocell,
            pid: config.build_controller(),
            lines: LineAssembler::new(),
            period_ms: config.control_period_ms,
            telemetry_every: config.telemetry_every,
            tick_count: 0,
            enabled: false,
            dropped_seen: 0,
        }
    }

    // ── Calibration ───────────────────────────────────────────

    /// Run the photocell calibration sequence now.
    ///
    /// Blocks for the settle delays.  On failure the previous bounds stay
    /// in use and [`Fault::CalibrationRejected`] is latched.  The LED is
    /// left running at duty 0.
    pub fn calibrate(
        &mut self,
        adc: &mut impl AnalogSampler,
        led: &mut impl ActuatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<Bounds> {
        info!("Calibrating photocell");
        led.start();
        match self.photocell.calibrate(adc, |duty| led.set_duty(duty), delay) {
            Ok(bounds) => {
                sink.emit(&LoopEvent::Calibrated(bounds));
                Ok(bounds)
            }
            Err(e) => {
                self.faults.raise(Fault::CalibrationRejected);
                sink.emit(&LoopEvent::CalibrationFailed(e));
                Err(e.into())
            }
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle: snapshot → (calibrate) → read → compute →
    /// actuate → telemetry.
    ///
    /// Returns `None` while the loop is disabled.
    pub fn tick(
        &mut self,
        adc: &mut impl AnalogSampler,
        led: &mut impl ActuatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Option<CycleReport> {
        // 1. One consistent view of the command-writable parameters
        let params = self.params.snapshot();
        self.pid.apply(&params);

        // 2. Pending calibration runs between cycles
        if self.params.take_calibration_request() {
            let _ = self.calibrate(adc, led, delay, sink);
        }

        // 3. Enable / disable edges
        if params.enabled != self.enabled {
            self.enabled = params.enabled;
            if params.enabled {
                self.pid.reset();
                led.start();
                sink.emit(&LoopEvent::Enabled);
            } else {
                led.set_duty(0);
                sink.emit(&LoopEvent::Disabled);
            }
        }

        let report = if self.enabled {
            Some(self.run_active_cycle(adc, led, sink))
        } else {
            None
        };

        // 4. Output backpressure
        let dropped = sink.dropped_bytes();
        if dropped > self.dropped_seen {
            self.dropped_seen = dropped;
            self.faults.raise(Fault::LogOverflow);
        }

        report
    }

    fn run_active_cycle(
        &mut self,
        adc: &mut impl AnalogSampler,
        led: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        self.tick_count += 1;

        let lux = self.photocell.read(adc);
        if self.photocell.consecutive_failures() > 0 {
            self.faults.raise(Fault::SensorRead);
        }

        // Saturating cast: NaN → 0, out of range → 0 / 255, then clamped
        // by the actuator.
        let output = self.pid.compute(f32::from(lux));
        led.set_duty(output as u8);
        let duty = led.duty();

        if self.telemetry_every > 0 && self.tick_count % u64::from(self.telemetry_every) == 0 {
            sink.emit(&LoopEvent::Telemetry(TelemetryData {
                lux,
                duty,
                output,
                tick: self.tick_count,
            }));
        }

        CycleReport { lux, output, duty }
    }

    // ── Console ───────────────────────────────────────────────

    /// Assemble and execute every complete line waiting on `rx`.
    pub fn poll_commands(
        &mut self,
        rx: &mut impl SerialTransport,
        led: &mut impl ActuatorPort,
        log: &dyn LogControl,
        out: &mut dyn fmt::Write,
    ) {
        let (params, faults) = (self.params, self.faults);
        let (photocell, ticks) = (&self.photocell, self.tick_count);
        self.lines.poll(rx, &mut |line: Line<'_>| {
            let mut ctx = CommandContext {
                params,
                faults,
                actuator: &mut *led,
                log,
                status: loop_status(photocell, ticks),
                out: &mut *out,
            };
            run_line(line, &mut ctx);
        });
    }

    /// Execute one already-assembled command line.
    pub fn handle_line(
        &mut self,
        line: &str,
        led: &mut impl ActuatorPort,
        log: &dyn LogControl,
        out: &mut dyn fmt::Write,
    ) -> Dispatch {
        let mut ctx = CommandContext {
            params: self.params,
            faults: self.faults,
            actuator: led,
            log,
            status: self.status(),
            out,
        };
        debug!("CMD: {line}");
        cli::dispatch(line, &mut ctx)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> LoopStatus {
        loop_status(&self.photocell, self.tick_count)
    }

    /// Control period from configuration.
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Active cycles since start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn photocell(&self) -> &Photocell {
        &self.photocell
    }

    pub fn controller(&self) -> &PidController {
        &self.pid
    }
}

fn loop_status(photocell: &Photocell, ticks: u64) -> LoopStatus {
    LoopStatus {
        lux: photocell.last_level(),
        bounds: photocell.bounds(),
        ticks,
    }
}

fn run_line(line: Line<'_>, ctx: &mut CommandContext<'_>) {
    if line.truncated() {
        ctx.faults.raise(Fault::LineOverflow);
    }
    let Some(text) = line.as_str() else {
        warn!("Dropping non-UTF-8 command line ({} bytes)", line.bytes().len());
        return;
    };
    debug!("CMD: {text}");
    cli::dispatch(text, ctx);
}
