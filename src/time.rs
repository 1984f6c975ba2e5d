//! Minute-of-day arithmetic, millisecond timing and daylight-saving rules.
//!
//! All schedule times are local minutes in `[0, 1440)`. Millisecond
//! uptime counters are `u32` and wrap roughly every 49.7 days, so every
//! elapsed-time computation goes through [`elapsed_ms`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Minutes in one local day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Normalise a signed minute count into `[0, 1440)`.
pub fn wrap_minutes(minutes: i32) -> u16 {
    minutes.rem_euclid(i32::from(MINUTES_PER_DAY)) as u16
}

/// Minutes from `start` to `end`; `end < start` means the span crosses
/// midnight.
pub fn duration_minutes(start: u16, end: u16) -> u16 {
    if end >= start {
        end - start
    } else {
        MINUTES_PER_DAY - start + end
    }
}

/// Minute-of-day from an hour/minute pair, clamped to the last minute of
/// the day for out-of-range register values.
pub fn minute_of_day(hour: u32, minute: u32) -> u16 {
    let hour = hour.min(23);
    let minute = minute.min(59);
    (hour * 60 + minute) as u16
}

/// Minute-of-day of a local timestamp.
pub fn minute_of(now: &NaiveDateTime) -> u16 {
    minute_of_day(now.hour(), now.minute())
}

/// Split a minute-of-day into `(hour, minute)` for alarm registers.
pub fn hour_minute(minute: u16) -> (u8, u8) {
    let m = minute % MINUTES_PER_DAY;
    ((m / 60) as u8, (m % 60) as u8)
}

/// Milliseconds elapsed since `since`, correct across counter rollover.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

// ---------------------------------------------------------------------------
// Daylight saving
// ---------------------------------------------------------------------------

/// Which daylight-saving rule, if any, shifts the configured UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DstPolicy {
    /// Standard time all year.
    None,
    /// US rule: second Sunday in March 02:00 until first Sunday in
    /// November 02:00, local wall time.
    #[default]
    UnitedStates,
}

impl DstPolicy {
    /// Whether daylight time applies at `hour` (local wall clock) on `date`.
    pub fn in_effect(self, date: NaiveDate, hour: u32) -> bool {
        match self {
            Self::None => false,
            Self::UnitedStates => us_dst_in_effect(date, hour),
        }
    }

    /// UTC offset to use for `date` at `hour`, given the standard offset.
    pub fn effective_offset(self, standard_offset: i8, date: NaiveDate, hour: u32) -> i8 {
        if self.in_effect(date, hour) {
            standard_offset.saturating_add(1)
        } else {
            standard_offset
        }
    }
}

fn us_dst_in_effect(date: NaiveDate, hour: u32) -> bool {
    let year = date.year();
    let (Some(start), Some(end)) = (
        NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2),
        NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1),
    ) else {
        return false;
    };

    if date == start {
        return hour >= 2;
    }
    if date == end {
        return hour < 2;
    }
    date > start && date < end
}
