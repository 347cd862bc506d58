//! Integration tests: ControlLoop → Photocell → PI controller → actuator.

use lightloop::app::events::LoopEvent;
use lightloop::app::service::ControlLoop;
use lightloop::config::LoopConfig;
use lightloop::control::shared::SharedParams;
use lightloop::drivers::LedPwm;
use lightloop::error::{CalibrationError, Error};
use lightloop::faults::{Fault, FaultRegister};
use lightloop::sensors::Bounds;

use crate::mock_hw::{EventLog, LedCall, MockAdc, MockLed, MockLevel, NoDelay, RecordingPwm};

fn running() -> LoopConfig {
    LoopConfig {
        start_enabled: true,
        ..LoopConfig::default()
    }
}

#[test]
fn calibration_sweeps_led_and_applies_bounds() {
    let config = LoopConfig::default();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);

    let script = std::iter::repeat_n(Some(3000), 16).chain(std::iter::repeat_n(Some(500), 16));
    let mut adc = MockAdc::scripted(script);
    let mut led = MockLed::new();
    let mut delay = NoDelay::default();
    let mut events = EventLog::default();

    let bounds = control
        .calibrate(&mut adc, &mut led, &mut delay, &mut events)
        .unwrap();

    let expected = Bounds {
        raw_min: 500,
        raw_max: 3000,
    };
    assert_eq!(bounds, expected);
    assert_eq!(control.photocell().bounds(), expected);
    assert_eq!(
        led.calls,
        vec![LedCall::Start, LedCall::SetDuty(100), LedCall::SetDuty(0)]
    );
    assert_eq!(adc.conversions, 32);
    assert_eq!(delay.total_ns, 200_000_000, "two 100 ms settle delays");
    assert_eq!(events.events, vec![LoopEvent::Calibrated(expected)]);
    assert!(!faults.has_faults());
}

#[test]
fn rejected_calibration_keeps_bounds_and_latches_fault() {
    let config = LoopConfig::default();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let before = control.photocell().bounds();

    let mut adc = MockAdc::constant(2000);
    let mut led = MockLed::new();
    let mut events = EventLog::default();
    let err = control
        .calibrate(&mut adc, &mut led, &mut NoDelay::default(), &mut events)
        .unwrap_err();

    let cause = CalibrationError::InsufficientSpread {
        high: 2000,
        low: 2000,
    };
    assert_eq!(err, Error::Calibration(cause));
    assert_eq!(control.photocell().bounds(), before);
    assert!(faults.has_fault(Fault::CalibrationRejected));
    assert_eq!(led.last_duty(), Some(0), "LED left off");
    assert_eq!(events.events, vec![LoopEvent::CalibrationFailed(cause)]);
}

#[test]
fn calibrate_command_runs_before_next_cycle() {
    let config = running();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut led = MockLed::new();

    let mut out = String::new();
    control.handle_line("calibrate", &mut led, &MockLevel::default(), &mut out);
    assert_eq!(out, "Calibration scheduled\r\n");

    // 16 high, 16 low, then one cycle reading mid-scale.
    let script = std::iter::repeat_n(Some(3000), 16)
        .chain(std::iter::repeat_n(Some(1000), 16))
        .chain([Some(2000)]);
    let mut adc = MockAdc::scripted(script);
    let report = control
        .tick(&mut adc, &mut led, &mut NoDelay::default(), &mut EventLog::default())
        .unwrap();

    assert_eq!(control.photocell().bounds(), Bounds { raw_min: 1000, raw_max: 3000 });
    assert_eq!(report.lux, 50);
    assert!(!params.snapshot().calibrate_requested);
}

#[test]
fn failed_read_reuses_last_level_and_latches_fault() {
    let config = running();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut led = MockLed::new();
    let mut events = EventLog::default();

    let mut adc = MockAdc::scripted([Some(2048), None]);
    let first = control
        .tick(&mut adc, &mut led, &mut NoDelay::default(), &mut events)
        .unwrap();
    assert_eq!(first.lux, 50);
    assert!(!faults.has_faults());

    let second = control
        .tick(&mut adc, &mut led, &mut NoDelay::default(), &mut events)
        .unwrap();
    assert_eq!(second.lux, 50);
    assert!(faults.has_fault(Fault::SensorRead));
    assert_eq!(faults.sensor_failures(), 1);
}

#[test]
fn telemetry_every_n_cycles() {
    let config = LoopConfig {
        telemetry_every: 3,
        ..running()
    };
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut adc = MockAdc::constant(4095);
    let mut led = MockLed::new();
    let mut events = EventLog::default();

    for _ in 0..7 {
        control.tick(&mut adc, &mut led, &mut NoDelay::default(), &mut events);
    }
    assert_eq!(control.tick_count(), 7);
    // Bright room: lux 100 > setpoint 50, output clamps to 0.
    assert_eq!(events.telemetry(), vec![(100, 0), (100, 0)]);
    assert_eq!(events.events.first(), Some(&LoopEvent::Enabled));
}

#[test]
fn restart_clears_integral() {
    let config = running();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut adc = MockAdc::constant(0);
    let mut led = MockLed::new();
    let mut events = EventLog::default();
    let mut delay = NoDelay::default();

    for _ in 0..3 {
        control.tick(&mut adc, &mut led, &mut delay, &mut events);
    }
    assert_eq!(control.controller().integral(), 150.0);

    params.set_enabled(false);
    assert!(control.tick(&mut adc, &mut led, &mut delay, &mut events).is_none());
    assert_eq!(led.last_duty(), Some(0));
    assert_eq!(events.events.last(), Some(&LoopEvent::Disabled));

    params.set_enabled(true);
    control.tick(&mut adc, &mut led, &mut delay, &mut events);
    assert_eq!(control.controller().integral(), 50.0);
}

#[test]
fn proportional_only_loop_tracks_setpoint() {
    let config = LoopConfig {
        ki: None,
        ..running()
    };
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut led = MockLed::new();
    let mut events = EventLog::default();

    let dark = control
        .tick(&mut MockAdc::constant(0), &mut led, &mut NoDelay::default(), &mut events)
        .unwrap();
    assert_eq!(dark.duty, 50);

    let bright = control
        .tick(&mut MockAdc::constant(4095), &mut led, &mut NoDelay::default(), &mut events)
        .unwrap();
    assert_eq!(bright.duty, 0);
    assert_eq!(control.controller().integral(), 0.0);

    let mut out = String::new();
    control.handle_line("ki 0.5", &mut led, &MockLevel::default(), &mut out);
    assert_eq!(out, "Error: Controller has no integral term\r\n");
}

#[test]
fn log_drops_latch_overflow_fault() {
    let config = LoopConfig::default();
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut adc = MockAdc::constant(0);
    let mut led = MockLed::new();
    let mut delay = NoDelay::default();
    let mut events = EventLog::default();

    control.tick(&mut adc, &mut led, &mut delay, &mut events);
    assert!(!faults.has_fault(Fault::LogOverflow));

    events.dropped = 12;
    control.tick(&mut adc, &mut led, &mut delay, &mut events);
    assert!(faults.has_fault(Fault::LogOverflow));

    // Same count again is not a new overflow.
    faults.clear(Fault::LogOverflow);
    control.tick(&mut adc, &mut led, &mut delay, &mut events);
    assert!(!faults.has_fault(Fault::LogOverflow));
}

#[test]
fn drives_real_pwm_driver() {
    let config = LoopConfig {
        pwm_timer_top: 1000,
        ..running()
    };
    let params = SharedParams::new(config.control_params());
    let faults = FaultRegister::new();
    let mut control = ControlLoop::new(&config, &params, &faults);
    let mut led = LedPwm::new(RecordingPwm::default(), 1, config.pwm_timer_top);

    let mut adc = MockAdc::constant(0);
    control.tick(&mut adc, &mut led, &mut NoDelay::default(), &mut EventLog::default());
    assert!(led.is_running());
    assert_eq!(led.duty(), 52);
    assert_eq!(led.sink().compares.last(), Some(&520));
    assert!(led.sink().enabled);
}
