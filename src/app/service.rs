//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the configuration, the event store, the scheduler
//! and the device registry. All I/O flows through port traits injected
//! at call sites, so the whole control loop runs against simulated pins
//! and a fake clock in tests.
//!
//! ```text
//!   ClockPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//!  AppCommand ──▶ │ Store · Scheduler · Reducer  │ ──▶ DevicePort
//!                 └──────────────────────────────┘ ◀─▶ ConfigPort
//! ```
//!
//! One [`tick`](AppService::tick) per control-loop iteration:
//!
//! 1. Advance device timers (lock pulse, door travel).
//! 2. Read the wall clock. If unset, report once and stop here.
//! 3. Evaluate if the minute changed, the scheduler etag moved, or a
//!    wake or config change forced it: refresh the day context, reduce
//!    the event table at the current minute, converge the devices.

use chrono::{NaiveDate, NaiveDateTime};
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::ports::{ClockPort, ConfigError, ConfigPort, DevicePort, EventSink};
use crate::config::{PersistentConfig, SystemConfig};
use crate::devices::{self, DeviceRegistry, DeviceState};
use crate::door::DoorMotion;
use crate::drivers::indicator::Pattern;
use crate::error::Result;
use crate::events::WakeSet;
use crate::schedule::apply::apply;
use crate::schedule::reducer::reduce;
use crate::schedule::{EventStore, NextEvent, Scheduler};
use crate::solar::{self, SolarTimes};
use crate::time::{self, elapsed_ms};

use super::commands::{AppCommand, CommandReply};
use super::events::AppEvent;

/// Quiet period after the last config change before auto-save, ms.
pub const AUTO_SAVE_DELAY_MS: u32 = 5_000;

/// DST is decided at this local hour of the date being computed.
const DST_PROBE_HOUR: u32 = 12;

/// Read-only view of the service for status displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub motion: DoorMotion,
    pub door: DeviceState,
    pub lock: DeviceState,
    pub clock_valid: bool,
    pub etag: u32,
    pub date: Option<NaiveDate>,
    pub solar: Option<SolarTimes>,
    pub next: Option<NextEvent>,
    pub indicator: Pattern,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<P> {
    config: SystemConfig,
    store: EventStore,
    scheduler: Scheduler,
    devices: DeviceRegistry<P>,
    /// Config came from storage rather than defaults.
    restored: bool,

    /// `None` until the first tick has looked at the clock.
    clock_valid: Option<bool>,
    last_minute: Option<u16>,
    last_etag: Option<u32>,
    last_motion: DoorMotion,
    force_eval: bool,
    now_ms: u32,

    config_dirty: bool,
    dirty_since_ms: u32,
    save_requested: bool,
}

impl<P: OutputPin> AppService<P> {
    /// Build the service from loaded configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: PersistentConfig, mut devices: DeviceRegistry<P>, restored: bool) -> Self {
        devices.door_mut().set_travel_ms(config.system.door_travel_ms);
        let last_motion = devices.door().motion();
        Self {
            config: config.system,
            store: EventStore::restore(config.events),
            scheduler: Scheduler::new(),
            devices,
            restored,
            clock_valid: None,
            last_minute: None,
            last_etag: None,
            last_motion,
            force_eval: true,
            now_ms: 0,
            config_dirty: false,
            dirty_since_ms: 0,
            save_requested: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its safe state and reset the scheduler.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if let Err(e) = self.devices.init() {
            warn!("app: device init incomplete: {e}");
            sink.emit(&AppEvent::Fault(e));
        }
        self.scheduler.reset();
        self.clock_valid = None;
        self.last_minute = None;
        self.last_etag = None;
        self.force_eval = true;
        self.last_motion = self.devices.door().motion();

        info!(
            "app: started ({} config, {} events)",
            if self.restored { "stored" } else { "default" },
            self.store.len()
        );
        sink.emit(&AppEvent::Started { restored: self.restored, events: self.store.len() });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle. Never blocks.
    pub fn tick(&mut self, clock: &impl ClockPort, sink: &mut impl EventSink) {
        self.now_ms = clock.uptime_ms();
        if let Err(e) = self.devices.tick(self.now_ms) {
            warn!("app: device tick failed: {e}");
            sink.emit(&AppEvent::Fault(e));
        }

        if let Some(now) = self.check_clock(clock.now(), sink) {
            let minute = time::minute_of(&now);
            if self.needs_evaluation(minute) {
                self.evaluate(now, minute, sink);
            }
        }

        self.report_motion(sink);
    }

    /// Force an evaluation on the next tick.
    pub fn note_wake(&mut self, wake: WakeSet) {
        if wake.is_empty() {
            return;
        }
        debug!("app: woken by {wake}");
        self.force_eval = true;
    }

    fn check_clock(&mut self, now: Option<NaiveDateTime>, sink: &mut impl EventSink) -> Option<NaiveDateTime> {
        let Some(now) = now else {
            if self.clock_valid != Some(false) {
                warn!("app: clock unset, scheduling suspended");
                sink.emit(&AppEvent::ClockUnset);
            }
            self.clock_valid = Some(false);
            return None;
        };
        if self.clock_valid == Some(false) {
            info!("app: clock restored at {now}");
            sink.emit(&AppEvent::ClockRestored);
            self.force_eval = true;
        }
        self.clock_valid = Some(true);
        Some(now)
    }

    fn needs_evaluation(&self, minute: u16) -> bool {
        self.force_eval
            || self.last_minute != Some(minute)
            || self.last_etag != Some(self.scheduler.etag())
    }

    fn evaluate(&mut self, now: NaiveDateTime, minute: u16, sink: &mut impl EventSink) {
        self.refresh_day(now.date(), sink);

        let reduced = reduce(self.store.table(), self.scheduler.solar(), minute);
        let commands = apply(&reduced, &mut self.devices);

        self.last_minute = Some(minute);
        self.last_etag = Some(self.scheduler.etag());
        self.force_eval = false;

        debug!("app: evaluated at minute {minute}, {commands} commands");
        sink.emit(&AppEvent::ScheduleApplied { minute, commands });
    }

    /// Install the day context for `date`, computing solar times only
    /// when the date changed or the cache was invalidated.
    fn refresh_day(&mut self, date: NaiveDate, sink: &mut impl EventSink) {
        if self.scheduler.date() == Some(date) && self.scheduler.is_solar_valid() {
            return;
        }
        let solar = self.compute_solar(date);
        if self.scheduler.update_day(date, solar) {
            sink.emit(&AppEvent::DayChanged { date, solar });
        }
    }

    fn compute_solar(&self, date: NaiveDate) -> Option<SolarTimes> {
        let loc = self.config.location?;
        let offset = self.config.dst.effective_offset(self.config.utc_offset_hours, date, DST_PROBE_HOUR);
        match solar::compute(date, loc.latitude, loc.longitude, offset) {
            Ok(times) => Some(times),
            Err(e) => {
                info!("app: no solar times for {date}: {e}");
                None
            }
        }
    }

    fn report_motion(&mut self, sink: &mut impl EventSink) {
        let motion = self.devices.door().motion();
        if motion != self.last_motion {
            sink.emit(&AppEvent::DoorMotion { from: self.last_motion, to: motion });
            self.last_motion = motion;
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command. Rejected commands change nothing.
    pub fn handle_command(&mut self, cmd: AppCommand) -> Result<CommandReply> {
        match cmd {
            AppCommand::AddEvent(spec) => {
                let id = self.store.add(spec, &mut self.scheduler)?;
                self.mark_config_dirty();
                return Ok(CommandReply::EventAdded(id));
            }
            AppCommand::UpdateEvent(id, spec) => {
                self.store.update(id, spec, &mut self.scheduler)?;
                self.mark_config_dirty();
            }
            AppCommand::DeleteEvent(id) => {
                self.store.delete(id, &mut self.scheduler)?;
                self.mark_config_dirty();
            }
            AppCommand::ClearEvents => {
                self.store.clear(&mut self.scheduler);
                self.mark_config_dirty();
            }
            AppCommand::SetLocation(location) => {
                self.update_site(|c| c.location = location)?;
            }
            AppCommand::SetUtcOffset(hours) => {
                self.update_site(|c| c.utc_offset_hours = hours)?;
            }
            AppCommand::SetDstPolicy(policy) => {
                self.update_site(|c| c.dst = policy)?;
            }
            AppCommand::SetDoorTravel(ms) => {
                self.update_config(|c| c.door_travel_ms = ms)?;
                self.devices.door_mut().set_travel_ms(ms);
            }
            AppCommand::SetDevice { id, state } => {
                info!("app: manual {} -> {state}", devices::name(id).unwrap_or("?"));
                self.devices.set_state(id, state)?;
            }
            AppCommand::ClockAdjusted => {
                info!("app: clock adjusted");
                self.scheduler.invalidate_solar();
                self.force_eval = true;
            }
            AppCommand::SaveConfig => {
                self.mark_config_dirty();
                self.save_requested = true;
            }
        }
        Ok(CommandReply::Done)
    }

    /// Apply `f` to a copy of the config; keep it only if it validates.
    fn update_config(&mut self, f: impl FnOnce(&mut SystemConfig)) -> core::result::Result<(), ConfigError> {
        let mut candidate = self.config;
        f(&mut candidate);
        candidate.validate()?;
        if candidate != self.config {
            self.config = candidate;
            self.mark_config_dirty();
        }
        Ok(())
    }

    /// Like [`update_config`](Self::update_config) for fields the solar
    /// times depend on.
    fn update_site(&mut self, f: impl FnOnce(&mut SystemConfig)) -> core::result::Result<(), ConfigError> {
        self.update_config(f)?;
        self.scheduler.invalidate_solar();
        self.force_eval = true;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        let motion = self.devices.door().motion();
        let clock_valid = self.clock_valid == Some(true);
        StatusSnapshot {
            motion,
            door: self.devices.door().state(),
            lock: self.devices.door().lock().state(),
            clock_valid,
            etag: self.scheduler.etag(),
            date: self.scheduler.date(),
            solar: self.scheduler.solar().copied(),
            next: self.next_event(),
            indicator: Pattern::select(motion, clock_valid),
        }
    }

    /// Next event as seen from the last evaluated minute.
    pub fn next_event(&self) -> Option<NextEvent> {
        let minute = self.last_minute?;
        self.scheduler.next_event_after(&self.store, minute)
    }

    /// `(hour, minute)` to program into the RTC alarm.
    pub fn next_alarm(&self) -> Option<(u8, u8)> {
        self.next_event().map(|next| time::hour_minute(next.minute))
    }

    pub fn current_config(&self) -> SystemConfig {
        self.config
    }

    /// Snapshot of everything that is persisted.
    pub fn persistent_config(&self) -> PersistentConfig {
        PersistentConfig { system: self.config, events: *self.store.table() }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn devices(&self) -> &DeviceRegistry<P> {
        &self.devices
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified. Each change restarts the quiet period.
    pub fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
        self.dirty_since_ms = self.now_ms;
    }

    /// Save once the config has been quiet for [`AUTO_SAVE_DELAY_MS`], or
    /// immediately after [`AppCommand::SaveConfig`]. Returns `true` if
    /// the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &mut impl ConfigPort, sink: &mut impl EventSink) -> bool {
        if !self.config_dirty {
            return false;
        }
        if !self.save_requested && elapsed_ms(self.now_ms, self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        self.save(storage, sink)
    }

    /// Force-save if dirty (call before deep sleep).
    pub fn force_save_if_dirty(&mut self, storage: &mut impl ConfigPort, sink: &mut impl EventSink) -> bool {
        self.config_dirty && self.save(storage, sink)
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    fn save(&mut self, storage: &mut impl ConfigPort, sink: &mut impl EventSink) -> bool {
        match storage.save(&self.persistent_config()) {
            Ok(()) => {
                self.config_dirty = false;
                self.save_requested = false;
                info!("app: config saved");
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("app: config save failed: {e}");
                sink.emit(&AppEvent::Fault(e.into()));
                // Retry after another quiet period rather than every tick.
                self.save_requested = false;
                self.dirty_since_ms = self.now_ms;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::config::Location;
    use crate::devices::{DOOR, RELAY_1};
    use crate::door::Door;
    use crate::drivers::relay::Relay;
    use crate::drivers::sim::{SimPin, WriteLog, bridge};
    use crate::error::{Error, StoreError};
    use crate::safety::LockActuator;
    use crate::schedule::{Action, EventSpec, When};

    struct FakeClock {
        now: Cell<Option<NaiveDateTime>>,
        ms: Cell<u32>,
    }

    impl FakeClock {
        fn at(h: u32, m: u32) -> Self {
            Self { now: Cell::new(Some(dt(h, m))), ms: Cell::new(0) }
        }

        fn set(&self, h: u32, m: u32) {
            self.now.set(Some(dt(h, m)));
        }

        fn advance_ms(&self, ms: u32) {
            self.ms.set(self.ms.get().wrapping_add(ms));
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

    #[derive(Default)]
    struct Recorder(Vec<AppEvent>);

    impl EventSink for Recorder {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(*event);
        }
    }

    impl Recorder {
        fn count(&self, f: impl Fn(&AppEvent) -> bool) -> usize {
            self.0.iter().filter(|e| f(e)).count()
        }
    }

    #[derive(Default)]
    struct FailingStore;

    impl ConfigPort for FailingStore {
        fn load(&self) -> core::result::Result<PersistentConfig, ConfigError> {
            Err(ConfigError::NotFound)
        }

        fn save(&mut self, _config: &PersistentConfig) -> core::result::Result<(), ConfigError> {
            Err(ConfigError::IoError)
        }
    }

    #[derive(Default)]
    struct SavedStore(Option<PersistentConfig>);

    impl ConfigPort for SavedStore {
        fn load(&self) -> core::result::Result<PersistentConfig, ConfigError> {
            self.0.clone().ok_or(ConfigError::NotFound)
        }

        fn save(&mut self, config: &PersistentConfig) -> core::result::Result<(), ConfigError> {
            self.0 = Some(config.clone());
            Ok(())
        }
    }

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 21).and_then(|d| d.and_hms_opt(h, m, 0)).unwrap()
    }

    fn service() -> (AppService<SimPin>, Recorder) {
        let (motor, _) = bridge();
        let (lock, _) = bridge();
        let log = WriteLog::default();
        let relays = [
            Relay::new(SimPin::new("relay1", log.clone())),
            Relay::new(SimPin::new("relay2", log)),
        ];
        let door = Door::new(motor, LockActuator::new(lock), 1_000);
        let mut app = AppService::new(PersistentConfig::default(), DeviceRegistry::new(door, relays), false);
        let mut sink = Recorder::default();
        app.start(&mut sink);
        (app, sink)
    }

    fn relay_on_at(h: u8, m: u8) -> AppCommand {
        AppCommand::AddEvent(EventSpec { device: RELAY_1, when: When::at(h, m), action: Action::Activate })
    }

    #[test]
    fn start_emits_started() {
        let (_, sink) = service();
        assert_eq!(sink.0, [AppEvent::Started { restored: false, events: 0 }]);
    }

    #[test]
    fn clock_unset_reported_once_and_skips_evaluation() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        clock.now.set(None);
        for _ in 0..3 {
            app.tick(&clock, &mut sink);
        }
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockUnset)), 1);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 0);
        assert!(!app.status().clock_valid);

        clock.set(8, 0);
        app.tick(&clock, &mut sink);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ClockRestored)), 1);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 1);
    }

    #[test]
    fn evaluates_once_per_minute() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        for _ in 0..5 {
            clock.advance_ms(20);
            app.tick(&clock, &mut sink);
        }
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 1);
        clock.set(8, 1);
        app.tick(&clock, &mut sink);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 2);
    }

    #[test]
    fn day_context_installed_with_solar_times() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        app.tick(&clock, &mut sink);
        let solar = app.status().solar.expect("default location has solar times");
        // Summer solstice at the default site, CDT.
        assert_eq!(solar.sunrise_std, 361);
        assert_eq!(solar.sunset_std, 1229);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::DayChanged { .. })), 1);
    }

    #[test]
    fn event_change_triggers_reevaluation_within_the_minute() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        app.tick(&clock, &mut sink);

        let reply = app.handle_command(relay_on_at(7, 0)).unwrap();
        assert!(matches!(reply, CommandReply::EventAdded(_)));
        app.tick(&clock, &mut sink);
        assert_eq!(app.devices().state(RELAY_1), Some(DeviceState::On));
        assert_eq!(
            sink.0.last().copied(),
            Some(AppEvent::ScheduleApplied { minute: 480, commands: 1 })
        );
    }

    #[test]
    fn door_opens_at_sunrise_offset_and_reports_motion() {
        let (mut app, mut sink) = service();
        app.handle_command(AppCommand::AddEvent(EventSpec {
            device: DOOR,
            when: When::solar(0),
            action: Action::Activate,
        }))
        .unwrap();

        let clock = FakeClock::at(5, 0);
        app.tick(&clock, &mut sink);
        assert_eq!(app.status().motion, DoorMotion::IdleUnknown);

        // 06:01 CDT
        clock.set(6, 1);
        app.tick(&clock, &mut sink);
        assert_eq!(app.status().motion, DoorMotion::MovingOpen);
        assert!(sink.0.contains(&AppEvent::DoorMotion {
            from: DoorMotion::IdleUnknown,
            to: DoorMotion::MovingOpen,
        }));

        clock.advance_ms(10);
        app.tick(&clock, &mut sink); // arms the travel timer
        clock.advance_ms(app.current_config().door_travel_ms);
        app.tick(&clock, &mut sink);
        assert_eq!(app.status().motion, DoorMotion::IdleOpen);
        assert_eq!(app.status().door, DeviceState::On);
    }

    #[test]
    fn invalid_location_rejected_without_change() {
        let (mut app, _) = service();
        let before = app.current_config();
        let err = app
            .handle_command(AppCommand::SetLocation(Some(Location { latitude: 91.0, longitude: 0.0 })))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ValidationFailed(_))));
        assert_eq!(app.current_config(), before);
        assert!(!app.is_config_dirty());
    }

    #[test]
    fn clearing_location_drops_solar_cache() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        app.tick(&clock, &mut sink);
        assert!(app.status().solar.is_some());

        app.handle_command(AppCommand::SetLocation(None)).unwrap();
        app.tick(&clock, &mut sink);
        assert!(app.status().solar.is_none());
    }

    #[test]
    fn store_errors_propagate() {
        let (mut app, _) = service();
        let bad = EventSpec { device: 9, when: When::at(1, 0), action: Action::Activate };
        assert_eq!(
            app.handle_command(AppCommand::AddEvent(bad)),
            Err(Error::Store(StoreError::InvalidDevice))
        );
    }

    #[test]
    fn next_event_wraps_to_tomorrow() {
        let (mut app, mut sink) = service();
        app.handle_command(relay_on_at(6, 0)).unwrap();
        app.handle_command(relay_on_at(20, 0)).unwrap();
        let clock = FakeClock::at(21, 0);
        app.tick(&clock, &mut sink);

        let next = app.next_event().unwrap();
        assert_eq!(next.minute, 360);
        assert!(next.tomorrow);
        assert_eq!(app.next_alarm(), Some((6, 0)));
    }

    #[test]
    fn auto_save_waits_for_quiet_period() {
        let (mut app, mut sink) = service();
        let mut storage = SavedStore::default();
        let clock = FakeClock::at(8, 0);
        app.tick(&clock, &mut sink);

        app.handle_command(relay_on_at(7, 0)).unwrap();
        clock.advance_ms(AUTO_SAVE_DELAY_MS - 1);
        app.tick(&clock, &mut sink);
        assert!(!app.auto_save_if_needed(&mut storage, &mut sink));

        clock.advance_ms(1);
        app.tick(&clock, &mut sink);
        assert!(app.auto_save_if_needed(&mut storage, &mut sink));
        assert!(!app.is_config_dirty());
        assert_eq!(storage.0.map(|c| c.events.iter().flatten().count()), Some(1));
    }

    #[test]
    fn explicit_save_is_immediate() {
        let (mut app, mut sink) = service();
        let mut storage = SavedStore::default();
        app.handle_command(AppCommand::SaveConfig).unwrap();
        assert!(app.auto_save_if_needed(&mut storage, &mut sink));
        assert!(sink.0.contains(&AppEvent::ConfigSaved));
    }

    #[test]
    fn failed_save_keeps_dirty_flag() {
        let (mut app, mut sink) = service();
        app.handle_command(AppCommand::SaveConfig).unwrap();
        assert!(!app.force_save_if_dirty(&mut FailingStore, &mut sink));
        assert!(app.is_config_dirty());
        assert!(sink.0.contains(&AppEvent::Fault(Error::Config(ConfigError::IoError))));
    }

    #[test]
    fn wake_forces_evaluation() {
        let (mut app, mut sink) = service();
        let clock = FakeClock::at(8, 0);
        app.tick(&clock, &mut sink);
        app.tick(&clock, &mut sink);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 1);

        app.note_wake(WakeSet::EMPTY.with(crate::events::WakeSource::RtcAlarm));
        app.tick(&clock, &mut sink);
        assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleApplied { .. })), 2);
    }
}
