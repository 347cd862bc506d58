//! Swappable log output backends.
//!
//! | Backend       | Output                         | `flush`        |
//! |---------------|--------------------------------|----------------|
//! | [`UartRing`]  | ring buffer → serial transport | no-op          |
//! | [`FileBackend`]| append-only file (host)       | `sync_data`    |
//! | [`Tee`]       | two backends in order          | both           |
//! | `Option<B>`   | `B`, or nothing when `None`    | `B`'s          |
//!
//! A backend is injected into [`LogChannel`](super::LogChannel) at
//! construction; the channel owns level filtering and formatting, the
//! backend only moves bytes.  Backends must never block and must never
//! report failure to the caller: lost output is only visible through
//! [`LogBackend::dropped`].

use super::ring::RingBuffer;
use crate::app::ports::SerialTransport;

/// Output strategy for the log channel.
pub trait LogBackend {
    /// Store or emit `msg`.  Best-effort; excess bytes are dropped.
    fn write(&mut self, msg: &[u8]);

    /// Force buffered data to durable storage.
    fn flush(&mut self) {}

    /// The transmitter finished sending `transmitted` bytes.
    fn on_transmit_complete(&mut self, _transmitted: usize) {}

    /// Bytes lost since construction.
    fn dropped(&self) -> u32 {
        0
    }

    /// Bytes accepted but not yet emitted.
    fn pending(&self) -> usize {
        0
    }
}

// ── UART ring backend ─────────────────────────────────────────

/// How the transmitter is fed from the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxMode {
    /// One byte per transmit-complete interrupt.
    Interrupt,
    /// The whole contiguous run up to the wrap boundary per request.
    Dma,
}

/// Non-blocking serial output through a byte ring.
///
/// `write` copies into the ring and kicks the transmitter when it is idle.
/// Each transmit-complete then advances `tail` and starts the next run, so
/// bytes leave in strict FIFO order and a run never spans the wrap.
pub struct UartRing<T, const N: usize> {
    ring: RingBuffer<N>,
    transport: T,
    mode: TxMode,
    /// Bytes handed to the transport and not yet confirmed.
    in_flight: usize,
    dropped: u32,
}

impl<T: SerialTransport, const N: usize> UartRing<T, N> {
    pub fn new(transport: T, mode: TxMode) -> Self {
        Self {
            ring: RingBuffer::new(),
            transport,
            mode,
            in_flight: 0,
            dropped: 0,
        }
    }

    /// Transmit-complete step: release `transmitted` bytes and start the
    /// next run, or go idle when the ring is empty.
    pub fn drain_step(&mut self, transmitted: usize) {
        let released = self.ring.advance_tail(transmitted.min(self.in_flight));
        self.in_flight -= released;
        if self.in_flight == 0 {
            self.start_next();
        }
    }

    /// True when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.ring.is_empty()
    }

    pub fn is_transmitting(&self) -> bool {
        self.in_flight > 0
    }

    pub fn ring(&self) -> &RingBuffer<N> {
        &self.ring
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn start_next(&mut self) {
        let max = match self.mode {
            TxMode::Interrupt => 1,
            TxMode::Dma => usize::MAX,
        };
        let run = self.ring.contiguous(max);
        if run.is_empty() {
            return;
        }
        self.in_flight = self.transport.send_nonblocking(run).min(run.len());
    }
}

impl<T: SerialTransport, const N: usize> LogBackend for UartRing<T, N> {
    fn write(&mut self, msg: &[u8]) {
        let stored = self.ring.push_slice(msg);
        self.dropped = self
            .dropped
            .saturating_add((msg.len() - stored) as u32);
        if self.in_flight == 0 {
            self.start_next();
        }
    }

    fn on_transmit_complete(&mut self, transmitted: usize) {
        self.drain_step(transmitted);
    }

    fn dropped(&self) -> u32 {
        self.dropped
    }

    fn pending(&self) -> usize {
        self.ring.len()
    }
}

// ── File backend (host) ───────────────────────────────────────

/// Durable append-only log file.  Write errors are counted as drops.
pub struct FileBackend {
    file: std::fs::File,
    dropped: u32,
}

impl FileBackend {
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self { file, dropped: 0 })
    }
}

impl LogBackend for FileBackend {
    fn write(&mut self, msg: &[u8]) {
        use std::io::Write;
        if self.file.write_all(msg).is_err() {
            self.dropped = self.dropped.saturating_add(msg.len() as u32);
        }
    }

    fn flush(&mut self) {
        let _ = self.file.sync_data();
    }

    fn dropped(&self) -> u32 {
        self.dropped
    }
}

// ── Tee ───────────────────────────────────────────────────────

/// Fan every call out to two backends.
pub struct Tee<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: LogBackend, B: LogBackend> LogBackend for Tee<A, B> {
    fn write(&mut self, msg: &[u8]) {
        self.first.write(msg);
        self.second.write(msg);
    }

    fn flush(&mut self) {
        self.first.flush();
        self.second.flush();
    }

    fn on_transmit_complete(&mut self, transmitted: usize) {
        self.first.on_transmit_complete(transmitted);
        self.second.on_transmit_complete(transmitted);
    }

    fn dropped(&self) -> u32 {
        self.first.dropped().saturating_add(self.second.dropped())
    }

    fn pending(&self) -> usize {
        self.first.pending().max(self.second.pending())
    }
}

// ── Optional backend ──────────────────────────────────────────

/// An absent backend discards output without counting it.
impl<B: LogBackend> LogBackend for Option<B> {
    fn write(&mut self, msg: &[u8]) {
        if let Some(b) = self {
            b.write(msg);
        }
    }

    fn flush(&mut self) {
        if let Some(b) = self {
            b.flush();
        }
    }

    fn on_transmit_complete(&mut self, transmitted: usize) {
        if let Some(b) = self {
            b.on_transmit_complete(transmitted);
        }
    }

    fn dropped(&self) -> u32 {
        self.as_ref().map_or(0, LogBackend::dropped)
    }

    fn pending(&self) -> usize {
        self.as_ref().map_or(0, LogBackend::pending)
    }
}
