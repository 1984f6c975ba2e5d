//! Day-scoped scheduler: today's solar cache plus a change counter.
//!
//! The scheduler never computes solar times itself. Whoever owns the
//! location, UTC offset and DST policy supplies them through
//! [`Scheduler::update_day`], and must call [`Scheduler::invalidate_solar`]
//! when any of those change.
//!
//! The etag is a wrapping `u32`. The driving loop remembers the last
//! value it acted on and re-evaluates when the current one differs;
//! magnitude carries no meaning.

use chrono::NaiveDate;
use log::{debug, info};

use crate::app::ports::ScheduleObserver;
use crate::solar::SolarTimes;

use super::resolve::resolve;
use super::{Event, EventId, EventStore};

/// Cached context for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DayContext {
    date: Option<NaiveDate>,
    solar: SolarTimes,
    valid: bool,
}

/// The next scheduled event as seen from some minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvent {
    pub id: EventId,
    pub minute: u16,
    /// The event falls after midnight, on the following day.
    pub tomorrow: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    day: DayContext,
    etag: u32,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            day: DayContext { date: None, solar: zero_solar(), valid: false },
            etag: 0,
        }
    }

    /// Back to the boot state: no date, no solar data, etag 0.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drop the cached solar times. Bumps the etag only if the cache was
    /// valid.
    pub fn invalidate_solar(&mut self) {
        if self.day.valid {
            self.day.valid = false;
            info!("scheduler: solar cache invalidated");
            self.touch();
        }
    }

    /// Install the day context for `date`. `solar` is `None` when solar
    /// times are unavailable for the date.
    ///
    /// No-op when both the date and the availability match the cache, so
    /// callers may invoke this on every evaluation. Returns whether the
    /// context changed.
    pub fn update_day(&mut self, date: NaiveDate, solar: Option<SolarTimes>) -> bool {
        if self.day.date == Some(date) && self.day.valid == solar.is_some() {
            return false;
        }

        self.day = DayContext {
            date: Some(date),
            solar: solar.unwrap_or(self.day.solar),
            valid: solar.is_some(),
        };
        match solar {
            Some(s) => info!(
                "scheduler: day {date} sunrise={} sunset={} dawn={} dusk={}",
                s.sunrise_std, s.sunset_std, s.sunrise_civil, s.sunset_civil
            ),
            None => info!("scheduler: day {date}, solar times unavailable"),
        }
        self.touch();
        true
    }

    /// Signal that something the schedule depends on changed.
    pub fn touch(&mut self) {
        self.etag = self.etag.wrapping_add(1);
        debug!("scheduler: etag {}", self.etag);
    }

    pub fn etag(&self) -> u32 {
        self.etag
    }

    /// Date of the cached context, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        self.day.date
    }

    /// Today's solar times, if the cache is valid.
    pub fn solar(&self) -> Option<&SolarTimes> {
        self.day.valid.then_some(&self.day.solar)
    }

    pub fn is_solar_valid(&self) -> bool {
        self.day.valid
    }

    /// Smallest resolved minute over all live events today. Ties keep the
    /// lower table index. Does not look at tomorrow.
    pub fn next_event_minute(&self, store: &EventStore) -> Option<u16> {
        self.earliest(store, |_| true).map(|(_, minute)| minute)
    }

    /// First event strictly after `now_minute` today; failing that, the
    /// earliest event of the table, flagged as tomorrow.
    ///
    /// Tomorrow is resolved against today's solar cache, which is within
    /// a minute or two of the real value and good enough for arming a
    /// wake alarm.
    pub fn next_event_after(&self, store: &EventStore, now_minute: u16) -> Option<NextEvent> {
        if let Some((ev, minute)) = self.earliest(store, |m| m > now_minute) {
            return Some(NextEvent { id: ev.id, minute, tomorrow: false });
        }
        self.earliest(store, |_| true)
            .map(|(ev, minute)| NextEvent { id: ev.id, minute, tomorrow: true })
    }

    fn earliest<'a>(
        &self,
        store: &'a EventStore,
        accept: impl Fn(u16) -> bool,
    ) -> Option<(&'a Event, u16)> {
        let solar = self.solar();
        let mut best: Option<(&Event, u16)> = None;
        for ev in store.iter() {
            let Ok(minute) = resolve(&ev.when, ev.action, solar) else {
                continue;
            };
            if !accept(minute) {
                continue;
            }
            if best.is_none_or(|(_, m)| minute < m) {
                best = Some((ev, minute));
            }
        }
        best
    }
}

impl ScheduleObserver for Scheduler {
    fn on_schedule_changed(&mut self) {
        self.touch();
    }
}

const fn zero_solar() -> SolarTimes {
    SolarTimes {
        sunrise_std: 0,
        sunset_std: 0,
        sunrise_civil: 0,
        sunset_civil: 0,
        day_length: 0,
        visible_length: 0,
    }
}
