//! Mock hardware for integration tests.
//!
//! `MockPin` is a shared-handle GPIO output: the driver owns one clone,
//! the test keeps another to observe levels and inject write failures.
//! `FakeClock` moves wall time and uptime together, minute by minute.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{ClockPort, EventSink};
use coopdoor::app::service::AppService;
use coopdoor::config::PersistentConfig;
use coopdoor::devices::DeviceRegistry;
use coopdoor::door::Door;
use coopdoor::drivers::hbridge::HBridge;
use coopdoor::drivers::relay::Relay;
use coopdoor::safety::LockActuator;

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct PinState {
    high: Cell<bool>,
    fail: Cell<bool>,
    writes: Cell<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct MockPin(Rc<PinState>);

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.0.high.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.fail.set(fail);
    }

    pub fn writes(&self) -> u32 {
        self.0.writes.get()
    }

    fn write(&self, high: bool) -> Result<(), PinFault> {
        if self.0.fail.get() {
            return Err(PinFault);
        }
        self.0.high.set(high);
        self.0.writes.set(self.0.writes.get() + 1);
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// `[INA, INB, EN]`
pub type BridgePins = [MockPin; 3];

pub fn bridge() -> (HBridge<MockPin>, BridgePins) {
    let pins: BridgePins = Default::default();
    let [a, b, en] = pins.clone();
    (HBridge::new(a, b, en), pins)
}

pub fn energized(pins: &BridgePins) -> bool {
    pins[2].is_high()
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Pins {
    pub motor: BridgePins,
    pub lock: BridgePins,
    pub relays: [MockPin; 2],
}

pub fn registry(travel_ms: u32) -> (DeviceRegistry<MockPin>, Pins) {
    let (motor, motor_pins) = bridge();
    let (lock, lock_pins) = bridge();
    let relay_pins: [MockPin; 2] = Default::default();
    let relays = [Relay::new(relay_pins[0].clone()), Relay::new(relay_pins[1].clone())];
    let door = Door::new(motor, LockActuator::new(lock), travel_ms);
    (
        DeviceRegistry::new(door, relays),
        Pins { motor: motor_pins, lock: lock_pins, relays: relay_pins },
    )
}

/// A started service over mock pins.
pub fn rig(config: PersistentConfig, restored: bool, sink: &mut RecordingSink) -> (AppService<MockPin>, Pins) {
    let (devices, pins) = registry(config.system.door_travel_ms);
    let mut app = AppService::new(config, devices, restored);
    app.start(sink);
    (app, pins)
}

// ── FakeClock ─────────────────────────────────────────────────

pub struct FakeClock {
    now: Cell<Option<NaiveDateTime>>,
    ms: Cell<u32>,
}

impl FakeClock {
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self {
            now: Cell::new(date.and_hms_opt(hour, minute, 0)),
            ms: Cell::new(0),
        }
    }

    pub fn unset() -> Self {
        Self { now: Cell::new(None), ms: Cell::new(0) }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(Some(now));
    }

    /// Advance uptime only; the wall clock follows whole seconds.
    pub fn advance_ms(&self, ms: u32) {
        let before = self.ms.get();
        self.ms.set(before.wrapping_add(ms));
        if let Some(now) = self.now.get() {
            let secs = (before % 1_000 + ms) / 1_000;
            self.now.set(Some(now + TimeDelta::seconds(i64::from(secs))));
        }
    }

    pub fn wall(&self) -> Option<NaiveDateTime> {
        self.now.get()
    }
}

impl ClockPort for FakeClock {
    fn now(&self) -> Option<NaiveDateTime> {
        self.now.get()
    }

    fn uptime_ms(&self) -> u32 {
        self.ms.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn count(&self, f: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

/// Run `ticks` control-loop iterations `step_ms` apart.
pub fn run(app: &mut AppService<MockPin>, clock: &FakeClock, sink: &mut RecordingSink, ticks: u32, step_ms: u32) {
    for _ in 0..ticks {
        clock.advance_ms(step_ms);
        app.tick(clock, sink);
    }
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 21).unwrap()
}
