//! LightLoop host simulation: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  SimAdc / SimPwm      StdinRx / StdoutTx      HostClock       │
//! │  (simulated plant)    (serial console)        (DelayNs)       │
//! │                                                              │
//! │  ───────────────── Port Trait Boundary ─────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  ControlLoop  ·  LogChannel  ·  SharedParams        │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `lightloop-sim [config.json] [log-file]`
//!
//! Commands are read from stdin; logs, replies and telemetry go to stdout
//! (and to `log-file` when given).  The process exits once stdin closes and
//! the log ring has drained.
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use log::info;

use lightloop::adapters::console::{StdinRx, StdoutTx, TxCompletion};
use lightloop::adapters::log_sink::{self, LogEventSink};
use lightloop::adapters::sim::{Plant, PlantConfig, SimAdc, SimPwm};
use lightloop::adapters::time::HostClock;
use lightloop::app::service::ControlLoop;
use lightloop::config::LoopConfig;
use lightloop::control::shared::SharedParams;
use lightloop::drivers::LedPwm;
use lightloop::faults::FaultRegister;
use lightloop::logging::{FileBackend, LOG_RING_SIZE, LogBackend, LogChannel, Tee, UartRing};

type Backend = Tee<UartRing<StdoutTx, LOG_RING_SIZE>, Option<FileBackend>>;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);

    // ── Configuration ─────────────────────────────────────────
    let config = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            LoopConfig::from_json(&text).with_context(|| format!("loading config {path}"))?
        }
        None => LoopConfig::default(),
    };
    let log_file = match args.next() {
        Some(path) => {
            Some(FileBackend::open(&path).with_context(|| format!("opening log file {path}"))?)
        }
        None => None,
    };

    // ── Logging ───────────────────────────────────────────────
    let (stdout, tx_done) = StdoutTx::new();
    let backend: Backend = Tee::new(UartRing::new(stdout, config.tx_mode), log_file);
    let channel: &'static LogChannel<Backend> =
        Box::leak(Box::new(LogChannel::new(backend, config.log_level)));
    log_sink::install(channel).map_err(|e| anyhow::anyhow!("installing logger: {e}"))?;

    info!("LightLoop simulation starting (period {} ms)", config.control_period_ms);

    // ── Plant + hardware ports ────────────────────────────────
    let plant = Plant::shared(PlantConfig {
        timer_top: config.pwm_timer_top,
        ..PlantConfig::default()
    });
    let mut adc = SimAdc::new(plant.clone());
    let mut led = LedPwm::new(SimPwm::new(plant), config.pwm_channel, config.pwm_timer_top);
    let mut rx = StdinRx::spawn().context("spawning stdin reader")?;
    let mut clock = HostClock::new();
    let mut sink = LogEventSink::new(channel);

    // ── Control runtime ───────────────────────────────────────
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);

    if config.calibrate_on_start {
        // A rejected run is latched as a fault and keeps the default bounds.
        let _ = control.calibrate(&mut adc, &mut led, &mut clock, &mut sink);
    }
    drain(channel, &tx_done);

    loop {
        control.poll_commands(&mut rx, &mut led, channel, &mut channel.replier());
        control.tick(&mut adc, &mut led, &mut clock, &mut sink);
        drain(channel, &tx_done);

        if rx.is_closed() && channel.pending() == 0 {
            break;
        }
        clock.delay_ms(control.period_ms());
    }

    info!(
        "Stdin closed after {} ms, {} cycles, faults=0b{:08b}",
        clock.uptime_ms(),
        control.tick_count(),
        faults.flags()
    );
    drain(channel, &tx_done);
    channel.flush();
    Ok(())
}

/// Stand-in for the UART transmit-complete interrupt: report finished
/// bytes and let the foreground start the next run until nothing moves.
fn drain<B: LogBackend>(channel: &LogChannel<B>, tx_done: &TxCompletion) {
    loop {
        let done = tx_done.take();
        if done == 0 {
            break;
        }
        channel.on_transmit_complete(done);
        channel.service();
    }
}
