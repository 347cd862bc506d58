//! Non-blocking log and telemetry channel.
//!
//! ```text
//! ┌──────────────┐  log()/telemetry()  ┌──────────────┐  send_nonblocking  ┌──────┐
//! │ any context  │────────────────────▶│  LogBackend  │───────────────────▶│ UART │
//! └──────────────┘                     │ (ring + tx)  │◀──────┐            └──┬───┘
//!                                      └──────────────┘       │ service()     │ TX complete ISR
//!                                                     ┌───────┴──────┐        │
//!                                                     │  tx_complete │◀───────┘
//!                                                     │  (atomic)    │
//!                                                     └──────────────┘
//! ```
//!
//! [`LogChannel`] is the process-wide logging context: threshold, enable
//! flag and the injected [`LogBackend`].  It is shared by `&` and is
//! `Sync`; the backend sits behind a critical-section mutex so producers in
//! interrupt and foreground context cannot interleave inside the ring.
//!
//! The transmit-complete interrupt only calls
//! [`on_transmit_complete`](LogChannel::on_transmit_complete), which adds
//! to an atomic counter.  The foreground calls
//! [`service`](LogChannel::service) to hand the count to the backend and
//! start the next transmission, so the transport is never re-entered from
//! interrupt context.
//!
//! Logging is best-effort.  Nothing here blocks or returns an error;
//! output that does not fit is dropped and counted.

pub mod backend;
pub mod ring;

use core::cell::RefCell;
use core::fmt::{self, Write as _};
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{Level, LevelFilter};

use crate::app::ports::LogControl;

pub use backend::{FileBackend, LogBackend, Tee, TxMode, UartRing};
pub use ring::RingBuffer;

/// Formatting scratch size.  Longer messages are truncated.
pub const LOG_SCRATCH_SIZE: usize = 256;

/// Default ring size for the UART backend.
pub const LOG_RING_SIZE: usize = 1024;

pub struct LogChannel<B> {
    backend: Mutex<CriticalSectionRawMutex, RefCell<B>>,
    level: AtomicU8,
    enabled: AtomicBool,
    tx_complete: AtomicUsize,
}

impl<B: LogBackend> LogChannel<B> {
    pub const fn new(backend: B, level: LevelFilter) -> Self {
        Self {
            backend: Mutex::new(RefCell::new(backend)),
            level: AtomicU8::new(level as usize as u8),
            enabled: AtomicBool::new(true),
            tx_complete: AtomicUsize::new(0),
        }
    }

    /// Format and enqueue a message at `level`.
    ///
    /// No-op when the channel is disabled or `level` is above the
    /// threshold.  The text is written as-is; include the trailing
    /// newline in `args`.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.would_log(level) {
            return;
        }
        self.enqueue(args);
    }

    /// Periodic telemetry line: `telemetry,<lux>,<duty>\n` at INFO.
    pub fn telemetry(&self, lux_percent: u8, duty_percent: u8) {
        self.log(
            Level::Info,
            format_args!("telemetry,{},{}\n", lux_percent, duty_percent),
        );
    }

    /// Command reply.  Ignores the level threshold but not `disable`.
    pub fn reply(&self, args: fmt::Arguments<'_>) {
        if !self.is_enabled() {
            return;
        }
        self.enqueue(args);
    }

    /// `fmt::Write` adapter over [`reply`](Self::reply).
    pub fn replier(&self) -> Replier<'_, B> {
        Replier { channel: self }
    }

    /// True if a message at `level` would be enqueued.
    pub fn would_log(&self, level: Level) -> bool {
        self.is_enabled() && level <= self.level()
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(level as usize as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> LevelFilter {
        level_from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Stop all output.  Every call short-circuits on this flag first.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Sync durable backends.
    pub fn flush(&self) {
        self.with_backend(|b| b.flush());
    }

    /// Transmit-complete notification.  Safe to call from an interrupt:
    /// it only touches an atomic counter.
    pub fn on_transmit_complete(&self, transmitted: usize) {
        self.tx_complete.fetch_add(transmitted, Ordering::AcqRel);
    }

    /// Foreground half of the drain: hand completed bytes to the backend
    /// and start the next run.  Also retries a transmission the transport
    /// refused earlier.
    pub fn service(&self) {
        let done = self.tx_complete.swap(0, Ordering::AcqRel);
        self.with_backend(|b| b.on_transmit_complete(done));
    }

    /// Bytes lost to a full backend since start.
    pub fn dropped(&self) -> u32 {
        self.with_backend(|b| b.dropped())
    }

    /// Bytes waiting to be transmitted.
    pub fn pending(&self) -> usize {
        self.with_backend(|b| b.pending())
    }

    /// Run `f` with exclusive access to the backend.
    ///
    /// `f` must not log through this channel.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.backend.lock(|cell| f(&mut cell.borrow_mut()))
    }

    fn enqueue(&self, args: fmt::Arguments<'_>) {
        let mut scratch = Scratch::<LOG_SCRATCH_SIZE>::new();
        let _ = scratch.write_fmt(args);
        if scratch.is_empty() {
            return;
        }
        self.with_backend(|b| b.write(scratch.as_bytes()));
    }
}

impl<B: LogBackend> LogControl for LogChannel<B> {
    fn level(&self) -> LevelFilter {
        LogChannel::level(self)
    }

    fn set_level(&self, level: LevelFilter) {
        LogChannel::set_level(self, level);
    }
}

fn level_from_u8(raw: u8) -> LevelFilter {
    match raw {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Command replies as a `fmt::Write` sink.
pub struct Replier<'a, B> {
    channel: &'a LogChannel<B>,
}

impl<B: LogBackend> fmt::Write for Replier<'_, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.channel.reply(format_args!("{}", s));
        Ok(())
    }
}

// ── Bounded formatting buffer ─────────────────────────────────

/// Fixed-size formatting target that truncates instead of failing.
struct Scratch<const N: usize> {
    buf: heapless::Vec<u8, N>,
}

impl<const N: usize> Scratch<N> {
    fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl<const N: usize> fmt::Write for Scratch<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = N - self.buf.len();
        let mut cut = s.len().min(room);
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        // Cannot fail: `cut <= room`.
        let _ = self.buf.extend_from_slice(&s.as_bytes()[..cut]);
        Ok(())
    }
}
