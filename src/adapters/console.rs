//! Stdio serial transport for the host simulation.
//!
//! The two directions are separate objects, as on a UART with split TX and
//! RX halves: [`StdoutTx`] is owned by the log channel's ring backend,
//! [`StdinRx`] is polled by the command interpreter.
//!
//! Stdout writes finish synchronously, so every accepted byte counts as
//! transmitted at once.  The count is parked in a [`TxCompletion`] that the
//! main loop hands to `LogChannel::on_transmit_complete`, standing in for
//! the transmit-complete interrupt.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::app::ports::SerialTransport;

/// Bytes accepted by [`StdoutTx`] and not yet reported as complete.
#[derive(Clone, Default)]
pub struct TxCompletion(Arc<AtomicUsize>);

impl TxCompletion {
    /// Take the pending count, leaving zero.
    pub fn take(&self) -> usize {
        self.0.swap(0, Ordering::AcqRel)
    }
}

pub struct StdoutTx {
    out: io::Stdout,
    done: TxCompletion,
}

impl StdoutTx {
    pub fn new() -> (Self, TxCompletion) {
        let done = TxCompletion::default();
        let tx = Self {
            out: io::stdout(),
            done: done.clone(),
        };
        (tx, done)
    }
}

impl SerialTransport for StdoutTx {
    fn send_nonblocking(&mut self, bytes: &[u8]) -> usize {
        let mut out = self.out.lock();
        if out.write_all(bytes).and_then(|()| out.flush()).is_err() {
            return 0;
        }
        self.done.0.fetch_add(bytes.len(), Ordering::AcqRel);
        bytes.len()
    }

    fn receive_nonblocking(&mut self) -> Option<u8> {
        None
    }
}

/// Stdin bytes delivered by a reader thread.
pub struct StdinRx {
    rx: Receiver<u8>,
    closed: bool,
}

impl StdinRx {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-rx".into())
            .spawn(move || {
                let stdin = io::stdin();
                for byte in stdin.lock().bytes() {
                    let Ok(byte) = byte else { break };
                    if tx.send(byte).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self { rx, closed: false })
    }

    /// Stdin reached EOF and every byte has been consumed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SerialTransport for StdinRx {
    fn send_nonblocking(&mut self, _bytes: &[u8]) -> usize {
        0
    }

    fn receive_nonblocking(&mut self) -> Option<u8> {
        match self.rx.try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }
}
