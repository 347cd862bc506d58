//! Mock hardware adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history without
//! a board, an ADC or a UART.

use std::cell::Cell;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use lightloop::app::events::LoopEvent;
use lightloop::app::ports::{
    ActuatorPort, AnalogSampler, EventSink, LogControl, PwmSink, SerialTransport,
};
use lightloop::error::SensorError;
use log::LevelFilter;

// ── ADC ───────────────────────────────────────────────────────

/// Returns scripted readings in order, then repeats the last one.
/// `None` entries time out.
pub struct MockAdc {
    script: VecDeque<Option<u16>>,
    last: Option<u16>,
    current: Option<u16>,
    pub conversions: u32,
}

#[allow(dead_code)]
impl MockAdc {
    pub fn constant(raw: u16) -> Self {
        Self::scripted([Some(raw)])
    }

    pub fn scripted(script: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: Some(0),
            current: None,
            conversions: 0,
        }
    }

    pub fn push(&mut self, reading: Option<u16>) {
        self.script.push_back(reading);
    }
}

impl AnalogSampler for MockAdc {
    fn start(&mut self) -> Result<(), SensorError> {
        self.conversions += 1;
        let next = match self.script.pop_front() {
            Some(r) => {
                self.last = r;
                r
            }
            None => self.last,
        };
        self.current = next;
        Ok(())
    }

    fn poll_for_result(&mut self, _timeout_ms: u32) -> Result<(), SensorError> {
        self.current.map(|_| ()).ok_or(SensorError::Timeout)
    }

    fn value(&mut self) -> u16 {
        self.current.unwrap_or(0)
    }
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCall {
    SetDuty(u8),
    Start,
    Stop,
}

#[derive(Default)]
pub struct MockLed {
    pub calls: Vec<LedCall>,
    duty: u8,
}

#[allow(dead_code)]
impl MockLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_duty(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            LedCall::SetDuty(d) => Some(*d),
            _ => None,
        })
    }
}

impl ActuatorPort for MockLed {
    fn set_duty(&mut self, percent: u8) {
        let duty = percent.min(100);
        self.duty = duty;
        self.calls.push(LedCall::SetDuty(duty));
    }

    fn duty(&self) -> u8 {
        self.duty
    }

    fn start(&mut self) {
        self.calls.push(LedCall::Start);
    }

    fn stop(&mut self) {
        self.calls.push(LedCall::Stop);
    }
}

/// Records compare writes for `LedPwm` tests.
#[derive(Default)]
pub struct RecordingPwm {
    pub compares: Vec<u32>,
    pub enabled: bool,
}

impl PwmSink for RecordingPwm {
    fn set_compare(&mut self, _channel: u32, value: u32) {
        self.compares.push(value);
    }

    fn enable(&mut self, _channel: u32) {
        self.enabled = true;
    }

    fn disable(&mut self, _channel: u32) {
        self.enabled = false;
    }
}

// ── Serial ────────────────────────────────────────────────────

/// RX queue plus TX capture.  `accept` caps bytes taken per send.
pub struct MockSerial {
    pub rx: VecDeque<u8>,
    pub sent: Vec<u8>,
    pub accept: usize,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            sent: Vec::new(),
            accept: usize::MAX,
        }
    }

    pub fn type_in(&mut self, text: &str) {
        self.rx.extend(text.bytes());
    }
}

impl SerialTransport for MockSerial {
    fn send_nonblocking(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.accept);
        self.sent.extend_from_slice(&bytes[..n]);
        n
    }

    fn receive_nonblocking(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

// ── Delay / events / log control ──────────────────────────────

/// Records requested delays without sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<LoopEvent>,
    pub dropped: u32,
}

#[allow(dead_code)]
impl EventLog {
    pub fn telemetry(&self) -> Vec<(u8, u8)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LoopEvent::Telemetry(t) => Some((t.lux, t.duty)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &LoopEvent) {
        self.events.push(*event);
    }

    fn dropped_bytes(&self) -> u32 {
        self.dropped
    }
}

pub struct MockLevel(pub Cell<LevelFilter>);

impl Default for MockLevel {
    fn default() -> Self {
        Self(Cell::new(LevelFilter::Info))
    }
}

impl LogControl for MockLevel {
    fn level(&self) -> LevelFilter {
        self.0.get()
    }

    fn set_level(&self, level: LevelFilter) {
        self.0.set(level);
    }
}
