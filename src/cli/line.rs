//! Serial line assembler.
//!
//! Bytes accumulate until `\n` or `\r`.  A terminator after at least one
//! byte yields the line and resets the buffer; a terminator on an empty
//! buffer (e.g. the `\n` of a `\r\n` pair) is ignored.
//!
//! ```text
//!   Idle ──byte──▶ Accumulating ──terminator──▶ (yield line) ──▶ Idle
//!                      │  ▲
//!            len==N-2  ▼  │ terminator
//!                   Discarding
//! ```
//!
//! Once the buffer holds `N - 2` bytes, further bytes are dropped until
//! the next terminator.  The kept prefix is still yielded, flagged as
//! truncated.

use log::info;

use crate::app::ports::SerialTransport;

/// Default line buffer size.
pub const LINE_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Idle,
    Accumulating,
    /// Buffer full; dropping bytes until the next terminator.
    Discarding,
}

/// A completed line.  Borrowed from the assembler until the next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    bytes: &'a [u8],
    truncated: bool,
}

impl<'a> Line<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The line as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.bytes).ok()
    }

    /// Bytes were discarded because the buffer filled up.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Receiver of completed lines.
pub trait LineHandler {
    fn on_line(&mut self, line: Line<'_>);
}

impl<F: FnMut(Line<'_>)> LineHandler for F {
    fn on_line(&mut self, line: Line<'_>) {
        self(line);
    }
}

/// Handler used when nothing else is registered: logs the line.
pub struct DefaultHandler;

impl LineHandler for DefaultHandler {
    fn on_line(&mut self, line: Line<'_>) {
        match line.as_str() {
            Some(text) => info!("CMD: {text}"),
            None => info!("CMD: <{} non-UTF-8 bytes>", line.bytes().len()),
        }
    }
}

pub struct LineAssembler<const N: usize> {
    buf: [u8; N],
    len: usize,
    state: LineState,
    truncated_lines: u32,
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineAssembler<N> {
    pub const fn new() -> Self {
        assert!(N > 2, "line buffer too small");
        Self {
            buf: [0; N],
            len: 0,
            state: LineState::Idle,
            truncated_lines: 0,
        }
    }

    /// Feed one byte.  Returns the completed line on a terminator.
    pub fn feed(&mut self, byte: u8) -> Option<Line<'_>> {
        if byte == b'\n' || byte == b'\r' {
            if self.len == 0 {
                self.state = LineState::Idle;
                return None;
            }
            let truncated = self.state == LineState::Discarding;
            if truncated {
                self.truncated_lines = self.truncated_lines.saturating_add(1);
            }
            let len = self.len;
            self.len = 0;
            self.state = LineState::Idle;
            return Some(Line {
                bytes: &self.buf[..len],
                truncated,
            });
        }

        if self.len < N - 2 {
            self.buf[self.len] = byte;
            self.len += 1;
            self.state = LineState::Accumulating;
        } else {
            self.state = LineState::Discarding;
        }
        None
    }

    /// Drain every byte the transport has ready, calling `handler` for each
    /// completed line.
    pub fn poll(&mut self, transport: &mut impl SerialTransport, handler: &mut impl LineHandler) {
        while let Some(byte) = transport.receive_nonblocking() {
            if let Some(line) = self.feed(byte) {
                handler.on_line(line);
            }
        }
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    /// Bytes held for the line in progress.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lines yielded with the truncated flag since start.
    pub fn truncated_lines(&self) -> u32 {
        self.truncated_lines
    }
}
