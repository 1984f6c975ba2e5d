//! Integration tests: pin failures and clock loss.

use embedded_hal::digital::ErrorKind;

use coopdoor::app::commands::AppCommand;
use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::DevicePort;
use coopdoor::config::PersistentConfig;
use coopdoor::devices::{DOOR, DeviceState, LOCK};
use coopdoor::door::DoorMotion;
use coopdoor::drivers::indicator::{Colour, Pattern};
use coopdoor::error::{Error, HwError};
use coopdoor::safety::LOCK_PULSE_MS;
use coopdoor::schedule::{Action, EventSpec, When};

use crate::mock_hw::{FakeClock, RecordingSink, date, energized, rig, run};

fn with_door_open_at(hour: u8, minute: u8) -> PersistentConfig {
    let mut sink = RecordingSink::default();
    let (mut app, _) = rig(PersistentConfig::default(), false, &mut sink);
    app.handle_command(AppCommand::AddEvent(EventSpec {
        device: DOOR,
        when: When::at(hour, minute),
        action: Action::Activate,
    }))
    .unwrap();
    app.persistent_config()
}

#[test]
fn motor_pin_failure_settles_unknown_then_retries_next_minute() {
    let mut sink = RecordingSink::default();
    let (mut app, pins) = rig(with_door_open_at(6, 0), true, &mut sink);
    let clock = FakeClock::at(date(), 6, 0);

    pins.motor[0].fail_writes(true);
    app.tick(&clock, &mut sink);
    assert_eq!(app.status().motion, DoorMotion::IdleUnknown);
    assert!(!energized(&pins.motor));
    assert_eq!(app.status().indicator, Pattern::Solid(Colour::Red));

    // Same minute: nothing changed, no retry.
    run(&mut app, &clock, &mut sink, 10, 100);
    assert_eq!(app.status().motion, DoorMotion::IdleUnknown);

    pins.motor[0].fail_writes(false);
    run(&mut app, &clock, &mut sink, 1, 60_000);
    assert_eq!(app.status().motion, DoorMotion::MovingOpen);
    assert!(energized(&pins.motor));

    let travel = app.current_config().door_travel_ms;
    run(&mut app, &clock, &mut sink, 1, 20);
    run(&mut app, &clock, &mut sink, 1, travel);
    assert_eq!(app.status().motion, DoorMotion::IdleOpen);
    assert_eq!(app.status().door, DeviceState::On);
}

#[test]
fn lock_stop_failure_is_reported_and_retried() {
    let mut sink = RecordingSink::default();
    let (mut app, pins) = rig(PersistentConfig::default(), false, &mut sink);
    let clock = FakeClock::at(date(), 12, 0);
    app.tick(&clock, &mut sink);

    app.handle_command(AppCommand::SetDevice { id: LOCK, state: DeviceState::On }).unwrap();
    assert!(energized(&pins.lock));
    run(&mut app, &clock, &mut sink, 1, 10); // arms

    pins.lock[2].fail_writes(true);
    run(&mut app, &clock, &mut sink, 3, LOCK_PULSE_MS);
    let gpio_fault = AppEvent::Fault(Error::Hardware(HwError::Gpio(ErrorKind::Other)));
    assert_eq!(sink.count(|e| *e == gpio_fault), 3);
    assert_eq!(app.devices().state(LOCK), Some(DeviceState::Unknown));

    pins.lock[2].fail_writes(false);
    run(&mut app, &clock, &mut sink, 1, 10);
    assert!(!energized(&pins.lock));
    assert_eq!(app.devices().state(LOCK), Some(DeviceState::On));
}

#[test]
fn clock_loss_suspends_schedule_until_time_is_set() {
    let mut sink = RecordingSink::default();
    let (mut app, pins) = rig(with_door_open_at(6, 0), true, &mut sink);
    let clock = FakeClock::unset();

    run(&mut app, &clock, &mut sink, 50, 20);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockUnset)), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 0);
    assert!(!energized(&pins.motor));
    assert_eq!(app.status().indicator, Pattern::Blink(Colour::Red));

    // Set at noon: the 06:00 open is already in the past and applies now.
    clock.set(date().and_hms_opt(12, 0, 0).unwrap());
    app.handle_command(AppCommand::ClockAdjusted).unwrap();
    run(&mut app, &clock, &mut sink, 1, 20);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockRestored)), 1);
    assert_eq!(app.status().motion, DoorMotion::MovingOpen);
    assert_eq!(app.status().indicator, Pattern::Blink(Colour::Green));
}

#[test]
fn unknown_device_command_is_rejected() {
    let mut sink = RecordingSink::default();
    let (mut app, _pins) = rig(PersistentConfig::default(), false, &mut sink);
    assert_eq!(
        app.handle_command(AppCommand::SetDevice { id: 6, state: DeviceState::On }),
        Err(Error::UnknownDevice(6))
    );
}
