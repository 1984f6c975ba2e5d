//! Integration tests: AppService ↔ ConfigStore across simulated reboots.

use coopdoor::adapters::config_store::{self, ConfigStore, KEY, MAX_BLOB_SIZE, NAMESPACE};
use coopdoor::adapters::memory::MemoryStorage;
use coopdoor::app::commands::{AppCommand, CommandReply};
use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{ConfigError, ConfigPort, StoragePort};
use coopdoor::app::service::AUTO_SAVE_DELAY_MS;
use coopdoor::config::{Location, PersistentConfig};
use coopdoor::devices::{DOOR, RELAY_2};
use coopdoor::schedule::{Action, EventSpec, When};
use coopdoor::time::DstPolicy;

use crate::mock_hw::{FakeClock, RecordingSink, date, rig, run};

fn door_open_at_sunrise() -> AppCommand {
    AppCommand::AddEvent(EventSpec { device: DOOR, when: When::solar(0), action: Action::Activate })
}

#[test]
fn config_and_events_survive_reboot() {
    let mut store = ConfigStore::new(MemoryStorage::new());
    let (config, restored) = store.load_or_default();
    assert!(!restored);

    let mut sink = RecordingSink::default();
    let (mut app, _pins) = rig(config, restored, &mut sink);
    let clock = FakeClock::at(date(), 12, 0);
    app.tick(&clock, &mut sink);

    let reply = app.handle_command(door_open_at_sunrise()).unwrap();
    assert!(matches!(reply, CommandReply::EventAdded(id) if id.get() == 1));
    app.handle_command(AppCommand::SetUtcOffset(-5)).unwrap();
    app.handle_command(AppCommand::SetDstPolicy(DstPolicy::None)).unwrap();
    app.handle_command(AppCommand::SetLocation(Some(Location { latitude: 40.0, longitude: -75.0 })))
        .unwrap();

    run(&mut app, &clock, &mut sink, 2, 20);
    assert!(!app.auto_save_if_needed(&mut store, &mut sink));
    run(&mut app, &clock, &mut sink, 1, AUTO_SAVE_DELAY_MS);
    assert!(app.auto_save_if_needed(&mut store, &mut sink));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ConfigSaved)), 1);

    // Reboot onto the same flash contents.
    let rebooted = ConfigStore::new(store.storage().clone());
    let (config, restored) = rebooted.load_or_default();
    assert!(restored);
    assert_eq!(config, app.persistent_config());

    let mut sink = RecordingSink::default();
    let (app, _pins) = rig(config, restored, &mut sink);
    assert_eq!(sink.events[0], AppEvent::Started { restored: true, events: 1 });
    assert_eq!(app.current_config().utc_offset_hours, -5);
    assert_eq!(app.current_config().dst, DstPolicy::None);
    assert_eq!(app.store().len(), 1);
}

#[test]
fn edits_within_quiet_period_postpone_save() {
    let mut store = ConfigStore::new(MemoryStorage::new());
    let mut sink = RecordingSink::default();
    let (mut app, _pins) = rig(PersistentConfig::default(), false, &mut sink);
    let clock = FakeClock::at(date(), 9, 0);
    app.tick(&clock, &mut sink);

    app.handle_command(door_open_at_sunrise()).unwrap();
    run(&mut app, &clock, &mut sink, 1, AUTO_SAVE_DELAY_MS - 100);
    app.handle_command(AppCommand::SetDoorTravel(12_000)).unwrap();
    run(&mut app, &clock, &mut sink, 1, 200);
    assert!(!app.auto_save_if_needed(&mut store, &mut sink));
    assert!(app.is_config_dirty());

    run(&mut app, &clock, &mut sink, 1, AUTO_SAVE_DELAY_MS);
    assert!(app.auto_save_if_needed(&mut store, &mut sink));
    assert_eq!(store.load().map(|c| c.system.door_travel_ms), Ok(12_000));
}

#[test]
fn corrupted_blob_boots_with_defaults() {
    let mut storage = MemoryStorage::new();
    storage.write(NAMESPACE, KEY, &[0xFF; 40]).unwrap();
    let store = ConfigStore::new(storage);
    assert_eq!(store.load(), Err(ConfigError::Incompatible));

    let (config, restored) = store.load_or_default();
    assert!(!restored);
    assert_eq!(config, PersistentConfig::default());

    let mut sink = RecordingSink::default();
    let (mut app, _pins) = rig(config, restored, &mut sink);
    assert_eq!(sink.events[0], AppEvent::Started { restored: false, events: 0 });

    // Defaults still schedule.
    app.handle_command(AppCommand::AddEvent(EventSpec {
        device: RELAY_2,
        when: When::at(6, 0),
        action: Action::Activate,
    }))
    .unwrap();
    app.tick(&FakeClock::at(date(), 7, 0), &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { commands: 1, .. })), 1);
}

#[test]
fn blob_from_other_format_version_is_ignored() {
    let mut buf = [0u8; MAX_BLOB_SIZE];
    let len = config_store::encode(&PersistentConfig::default(), &mut buf).unwrap();
    buf[4] = buf[4].wrapping_add(1);

    let mut storage = MemoryStorage::new();
    storage.write(NAMESPACE, KEY, &buf[..len]).unwrap();
    let store = ConfigStore::new(storage);
    assert_eq!(store.load(), Err(ConfigError::Incompatible));
    assert!(!store.load_or_default().1);
}

#[test]
fn cleared_table_is_persisted_empty() {
    let mut store = ConfigStore::new(MemoryStorage::new());
    let mut sink = RecordingSink::default();
    let (mut app, _pins) = rig(PersistentConfig::default(), false, &mut sink);

    app.handle_command(door_open_at_sunrise()).unwrap();
    app.handle_command(door_open_at_sunrise()).unwrap();
    assert!(app.force_save_if_dirty(&mut store, &mut sink));
    assert_eq!(store.load().map(|c| c.events.iter().flatten().count()), Ok(2));

    app.handle_command(AppCommand::ClearEvents).unwrap();
    app.handle_command(AppCommand::SaveConfig).unwrap();
    assert!(app.auto_save_if_needed(&mut store, &mut sink));
    assert_eq!(store.load().map(|c| c.events.iter().flatten().count()), Ok(0));
}
