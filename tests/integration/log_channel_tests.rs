//! Integration tests: LogChannel → UartRing → serial transport, with the
//! transmit-complete handoff driven the way the UART interrupt would.

use lightloop::adapters::log_sink::{self, LogEventSink};
use lightloop::app::events::{LoopEvent, TelemetryData};
use lightloop::app::ports::EventSink;
use lightloop::cli::{DefaultHandler, LINE_BUFFER_SIZE, LineAssembler};
use lightloop::logging::{LogChannel, Tee, TxMode, UartRing};
use log::{Level, LevelFilter};

use crate::mock_hw::MockSerial;

type Channel<const N: usize> = LogChannel<UartRing<MockSerial, N>>;

fn channel<const N: usize>(mode: TxMode, level: LevelFilter) -> Channel<N> {
    LogChannel::new(UartRing::new(MockSerial::new(), mode), level)
}

/// Simulate transmit-complete interrupts until the ring is empty.
fn drain<const N: usize>(ch: &Channel<N>) -> String {
    let mut guard = 0;
    while ch.pending() > 0 {
        // Over-reporting is clamped to what is actually in flight.
        ch.on_transmit_complete(N);
        ch.service();
        guard += 1;
        assert!(guard < 100_000, "drain stalled");
    }
    ch.with_backend(|b| String::from_utf8(b.transport().sent.clone()).unwrap())
}

#[test]
fn messages_leave_in_fifo_order() {
    for mode in [TxMode::Interrupt, TxMode::Dma] {
        let ch = channel::<64>(mode, LevelFilter::Debug);
        ch.log(Level::Info, format_args!("first\n"));
        ch.log(Level::Debug, format_args!("second {}\n", 2));
        ch.telemetry(48, 37);
        assert_eq!(drain(&ch), "first\nsecond 2\ntelemetry,48,37\n", "{mode:?}");
    }
}

#[test]
fn overflow_drops_tail_and_recovers() {
    let ch = channel::<16>(TxMode::Dma, LevelFilter::Info);
    ch.with_backend(|b| b.transport_mut().accept = 0);

    ch.log(Level::Info, format_args!("0123456789"));
    ch.log(Level::Info, format_args!("ABCDEFGHIJ"));
    assert_eq!(ch.pending(), 15);
    assert_eq!(ch.dropped(), 5);

    ch.with_backend(|b| b.transport_mut().accept = usize::MAX);
    // Retry is kicked by the next foreground service.
    ch.service();
    assert_eq!(drain(&ch), "0123456789ABCDE");

    // Space is reusable after the drain.
    ch.log(Level::Info, format_args!("ok\n"));
    assert!(drain(&ch).ends_with("ok\n"));
    assert_eq!(ch.dropped(), 5);
}

#[test]
fn isr_completion_without_service_does_not_transmit() {
    let ch = channel::<64>(TxMode::Interrupt, LevelFilter::Info);
    ch.log(Level::Info, format_args!("abc"));
    ch.on_transmit_complete(1);
    ch.on_transmit_complete(1);
    assert_eq!(
        ch.with_backend(|b| b.transport().sent.clone()),
        b"a",
        "only the kick from write() reaches the wire"
    );

    ch.service();
    assert_eq!(ch.with_backend(|b| b.transport().sent.clone()), b"ab");
}

#[test]
fn disabled_channel_is_silent() {
    let ch = channel::<64>(TxMode::Dma, LevelFilter::Trace);
    ch.disable();
    ch.log(Level::Error, format_args!("nope\n"));
    ch.telemetry(1, 1);
    assert_eq!(ch.pending(), 0);
    assert_eq!(drain(&ch), "");
}

#[test]
fn event_sink_reports_ring_drops() {
    let ch = channel::<8>(TxMode::Dma, LevelFilter::Info);
    ch.with_backend(|b| b.transport_mut().accept = 0);
    let mut sink = LogEventSink::new(&ch);

    sink.emit(&LoopEvent::Telemetry(TelemetryData {
        lux: 100,
        duty: 100,
        output: 100.0,
        tick: 1,
    }));
    // "telemetry,100,100\n" is 18 bytes; 7 fit.
    assert_eq!(sink.dropped_bytes(), 11);
}

#[test]
fn tee_mirrors_to_both_transports() {
    let ch = LogChannel::new(
        Tee::new(
            UartRing::<_, 64>::new(MockSerial::new(), TxMode::Dma),
            UartRing::<_, 64>::new(MockSerial::new(), TxMode::Dma),
        ),
        LevelFilter::Info,
    );
    ch.log(Level::Warn, format_args!("hello\n"));
    ch.with_backend(|t| {
        assert_eq!(t.first.transport().sent, b"hello\n");
        assert_eq!(t.second.transport().sent, b"hello\n");
    });
}

/// The one test in this binary that installs a global logger.  Other tests
/// may log concurrently, so only containment is asserted.
#[test]
fn default_handler_and_dispatch_warnings_reach_installed_channel() {
    let ch: &'static Channel<8192> = Box::leak(Box::new(channel(TxMode::Dma, LevelFilter::Info)));
    log_sink::install(ch).unwrap();

    let mut rx = MockSerial::new();
    rx.type_in("hello world\r\n");
    let mut asm = LineAssembler::<LINE_BUFFER_SIZE>::new();
    asm.poll(&mut rx, &mut DefaultHandler);

    let mut out = String::new();
    let mut led = crate::mock_hw::MockLed::new();
    let params = lightloop::control::shared::SharedParams::new(
        lightloop::config::LoopConfig::default().control_params(),
    );
    let faults = lightloop::faults::FaultRegister::new();
    let mut ctx = lightloop::cli::CommandContext {
        params: &params,
        faults: &faults,
        actuator: &mut led,
        log: ch,
        status: lightloop::cli::LoopStatus {
            lux: 0,
            bounds: lightloop::sensors::Bounds {
                raw_min: 0,
                raw_max: 4095,
            },
            ticks: 0,
        },
        out: &mut out,
    };
    lightloop::cli::dispatch("echo 1 2 3 4 5 6 7 8 9", &mut ctx);
    assert_eq!(out, "1 2 3 4 5 6 7\r\n");

    let sent = drain(ch);
    assert!(sent.contains("INFO CMD: hello world\n"), "{sent}");
    assert!(
        sent.contains("WARN echo: tokens beyond the first 8 ignored\n"),
        "{sent}"
    );
}
