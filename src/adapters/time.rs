//! Wall clock and uptime adapter.
//!
//! Implements [`ClockPort`].
//!
//! - **`feature = "espidf"`**: wall time from `gettimeofday()` +
//!   `localtime_r()` (the RTC keeps local time, so no TZ is configured),
//!   uptime from the `esp_timer` high-resolution counter.
//! - **host**: a settable simulated RTC plus `std::time::Instant`.

use chrono::NaiveDateTime;

use crate::app::ports::ClockPort;

/// Wall-clock times before this are treated as "never set".
pub const MIN_VALID_YEAR: i32 = 2020;

/// Clock adapter for the controller.
pub struct SystemClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
    /// Wall time at `set_at`, `None` while unset.
    #[cfg(not(feature = "espidf"))]
    rtc: std::cell::Cell<Option<(NaiveDateTime, std::time::Instant)>>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "espidf")]
impl SystemClock {
    pub fn new() -> Self {
        Self {}
    }

    /// Set the system wall clock (e.g. from the console).
    pub fn set(&self, now: NaiveDateTime) -> Result<(), crate::app::ports::ConfigError> {
        use esp_idf_svc::sys::{settimeofday, time_t, timeval};

        if !is_plausible(&now) {
            return Err(crate::app::ports::ConfigError::ValidationFailed("clock before 2020"));
        }
        let tv = timeval {
            tv_sec: now.and_utc().timestamp() as time_t,
            tv_usec: 0,
        };
        // SAFETY: `tv` is a valid timeval; a null timezone is permitted.
        if unsafe { settimeofday(&tv, core::ptr::null()) } != 0 {
            return Err(crate::app::ports::ConfigError::IoError);
        }
        log::info!("clock: set to {now}");
        Ok(())
    }
}

#[cfg(feature = "espidf")]
impl ClockPort for SystemClock {
    fn now(&self) -> Option<NaiveDateTime> {
        use chrono::NaiveDate;
        use esp_idf_svc::sys::{gettimeofday, localtime_r, time_t, timeval, tm};

        let mut tv = timeval { tv_sec: 0, tv_usec: 0 };
        // SAFETY: out-pointer to a stack timeval; null timezone is permitted.
        if unsafe { gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as time_t;
        // SAFETY: `tm` is plain C data; zeroed is a valid bit pattern.
        let mut tm: tm = unsafe { core::mem::zeroed() };
        // SAFETY: both pointers reference live stack values.
        if unsafe { localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(tm.tm_year + 1900, u32::try_from(tm.tm_mon + 1).ok()?, u32::try_from(tm.tm_mday).ok()?)?;
        let now = date.and_hms_opt(
            u32::try_from(tm.tm_hour).ok()?,
            u32::try_from(tm.tm_min).ok()?,
            u32::try_from(tm.tm_sec).ok()?.min(59),
        )?;
        is_plausible(&now).then_some(now)
    }

    fn uptime_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time has no preconditions after boot.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        // Truncation gives the wrapping millisecond counter.
        (us / 1_000) as u32
    }
}

#[cfg(not(feature = "espidf"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
            rtc: std::cell::Cell::new(None),
        }
    }

    /// Set the simulated RTC. Implausible times leave it unset.
    pub fn set(&self, now: NaiveDateTime) -> Result<(), crate::app::ports::ConfigError> {
        if !is_plausible(&now) {
            return Err(crate::app::ports::ConfigError::ValidationFailed("clock before 2020"));
        }
        self.rtc.set(Some((now, std::time::Instant::now())));
        log::info!("clock: set to {now}");
        Ok(())
    }

    /// Simulate loss of RTC backup power.
    pub fn clear(&self) {
        self.rtc.set(None);
    }
}

#[cfg(not(feature = "espidf"))]
impl ClockPort for SystemClock {
    fn now(&self) -> Option<NaiveDateTime> {
        let (base, at) = self.rtc.get()?;
        let elapsed = chrono::TimeDelta::from_std(at.elapsed()).ok()?;
        base.checked_add_signed(elapsed)
    }

    fn uptime_ms(&self) -> u32 {
        // Truncation gives the wrapping millisecond counter.
        self.start.elapsed().as_millis() as u32
    }
}

fn is_plausible(now: &NaiveDateTime) -> bool {
    use chrono::Datelike;
    now.year() >= MIN_VALID_YEAR
}
