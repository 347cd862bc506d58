//! Log channel adapters.
//!
//! - `impl log::Log for LogChannel` routes every `log::info!` / `warn!` /
//!   ... call in the crate into the channel, one `LEVEL message\n` line
//!   per record.
//! - [`LogEventSink`] implements [`EventSink`] by turning loop events into
//!   telemetry lines and log messages on the same channel.

use core::fmt;

use log::{Level, Log, Metadata, Record};

use crate::app::events::LoopEvent;
use crate::app::ports::EventSink;
use crate::logging::{LogBackend, LogChannel};

impl<B: LogBackend + Send> Log for LogChannel<B> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.would_log(metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        LogChannel::log(
            self,
            record.level(),
            format_args!("{} {}\n", record.level(), record.args()),
        );
    }

    fn flush(&self) {
        LogChannel::flush(self);
    }
}

/// Install `channel` as the global `log` backend.
///
/// The `log` max level is opened fully; the channel's own threshold does
/// the filtering so `log_level` can raise and lower it at runtime.
pub fn install<B: LogBackend + Send>(
    channel: &'static LogChannel<B>,
) -> Result<(), log::SetLoggerError> {
    log::set_logger(channel)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// [`EventSink`] that writes to a [`LogChannel`].
pub struct LogEventSink<'a, B> {
    channel: &'a LogChannel<B>,
}

impl<'a, B: LogBackend> LogEventSink<'a, B> {
    pub fn new(channel: &'a LogChannel<B>) -> Self {
        Self { channel }
    }

    /// Same line shape as the `log` facade, without needing it installed.
    fn line(&self, level: Level, args: fmt::Arguments<'_>) {
        self.channel.log(level, format_args!("{} {}\n", level, args));
    }
}

impl<B: LogBackend> EventSink for LogEventSink<'_, B> {
    fn emit(&mut self, event: &LoopEvent) {
        match event {
            LoopEvent::Telemetry(t) => self.channel.telemetry(t.lux, t.duty),
            LoopEvent::Enabled => self.line(Level::Info, format_args!("PID loop enabled")),
            LoopEvent::Disabled => self.line(Level::Info, format_args!("PID loop disabled")),
            LoopEvent::Calibrated(b) => self.line(
                Level::Info,
                format_args!("Calibration applied: min={}, max={}", b.raw_min, b.raw_max),
            ),
            LoopEvent::CalibrationFailed(e) => self.line(
                Level::Warn,
                format_args!("Calibration rejected, keeping previous bounds: {}", e),
            ),
        }
    }

    fn dropped_bytes(&self) -> u32 {
        self.channel.dropped()
    }
}
