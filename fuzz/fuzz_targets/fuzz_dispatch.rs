//! Fuzz target: command dispatch
//!
//! Feeds arbitrary text to the dispatcher with a live parameter block and
//! checks that no command can push the setpoint out of range or leave a
//! non-finite gain behind.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use core::cell::Cell;

use libfuzzer_sys::fuzz_target;
use lightloop::app::ports::{ActuatorPort, LogControl};
use lightloop::cli::{CommandContext, LoopStatus, dispatch};
use lightloop::config::LoopConfig;
use lightloop::control::shared::SharedParams;
use lightloop::faults::FaultRegister;
use lightloop::sensors::Bounds;
use log::LevelFilter;

struct Led(u8);

impl ActuatorPort for Led {
    fn set_duty(&mut self, percent: u8) {
        self.0 = percent.min(100);
    }
    fn duty(&self) -> u8 {
        self.0
    }
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

struct Level(Cell<LevelFilter>);

impl LogControl for Level {
    fn level(&self) -> LevelFilter {
        self.0.get()
    }
    fn set_level(&self, level: LevelFilter) {
        self.0.set(level);
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let params = SharedParams::new(LoopConfig::default().control_params());
    let faults = FaultRegister::new();
    let level = Level(Cell::new(LevelFilter::Info));
    let mut led = Led(0);
    let mut out = String::new();

    for line in text.split(['\r', '\n']) {
        let mut ctx = CommandContext {
            params: &params,
            faults: &faults,
            actuator: &mut led,
            log: &level,
            status: LoopStatus {
                lux: 0,
                bounds: Bounds { raw_min: 0, raw_max: 4095 },
                ticks: 0,
            },
            out: &mut out,
        };
        dispatch(line, &mut ctx);
    }

    let p = params.snapshot();
    assert!((0.0..=100.0).contains(&p.setpoint));
    assert!(p.kp.is_finite());
    assert!(p.ki.is_none_or(f32::is_finite));
    assert!(led.0 <= 100);
});
