//! Sunrise, sunset and civil twilight for one calendar day.
//!
//! Pure astronomy: NOAA approximate sunrise/sunset equations evaluated
//! four times per date (rise and set, at the official and civil zenith).
//! No config, no clock, no state. The caller supplies a UTC offset that
//! already includes any daylight-saving shift.
//!
//! ```text
//!   civil dawn ── sunrise ════ daylight ════ sunset ── civil dusk
//!        │◀──────────────── visible_length ──────────────▶│
//!                  │◀─────── day_length ──────▶│
//! ```

use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SolarError;
use crate::time::{MINUTES_PER_DAY, duration_minutes, wrap_minutes};

/// Official sunrise/sunset zenith (refraction + solar radius), degrees.
pub const ZENITH_OFFICIAL: f64 = 90.833;
/// Civil twilight zenith (sun 6° below the horizon), degrees.
pub const ZENITH_CIVIL: f64 = 96.0;

/// Solar instants for one date. Every field is a minute-of-day in
/// `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolarTimes {
    pub sunrise_std: u16,
    pub sunset_std: u16,
    pub sunrise_civil: u16,
    pub sunset_civil: u16,
    /// Sunrise to sunset.
    pub day_length: u16,
    /// Civil dawn to civil dusk.
    pub visible_length: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Horizon {
    Rise,
    Set,
}

/// Compute the four daily instants for `date` at the given location.
///
/// Fails for the whole day if any of the four events does not occur.
pub fn compute(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    utc_offset_hours: i8,
) -> Result<SolarTimes, SolarError> {
    if !latitude.is_finite()
        || !longitude.is_finite()
        || !(-90.0..=90.0).contains(&latitude)
        || !(-180.0..=180.0).contains(&longitude)
    {
        return Err(SolarError::InvalidLocation);
    }

    let n = f64::from(date.ordinal());
    let tz = f64::from(utc_offset_hours);
    let event = |zenith, horizon| event_minutes(n, latitude, longitude, tz, zenith, horizon);

    let sunrise_std = round_minute(event(ZENITH_OFFICIAL, Horizon::Rise)?);
    let sunset_std = round_minute(event(ZENITH_OFFICIAL, Horizon::Set)?);
    let sunrise_civil = round_minute(event(ZENITH_CIVIL, Horizon::Rise)?);
    let sunset_civil = round_minute(event(ZENITH_CIVIL, Horizon::Set)?);

    let times = SolarTimes {
        sunrise_std,
        sunset_std,
        sunrise_civil,
        sunset_civil,
        day_length: duration_minutes(sunrise_std, sunset_std),
        visible_length: duration_minutes(sunrise_civil, sunset_civil),
    };
    debug!(
        "solar {date}: dawn={} rise={} set={} dusk={}",
        times.sunrise_civil, times.sunrise_std, times.sunset_std, times.sunset_civil
    );
    Ok(times)
}

/// Round fractional minutes to the nearest minute (ties away from zero)
/// and normalise into `[0, 1440)`.
pub fn round_minute(minutes: f64) -> u16 {
    wrap_minutes(minutes.round() as i32)
}

/// One NOAA evaluation: fractional local minute-of-day of a rise or set.
fn event_minutes(
    day_of_year: f64,
    latitude: f64,
    longitude: f64,
    utc_offset: f64,
    zenith: f64,
    horizon: Horizon,
) -> Result<f64, SolarError> {
    let lng_hour = longitude / 15.0;
    let t = match horizon {
        Horizon::Rise => day_of_year + (6.0 - lng_hour) / 24.0,
        Horizon::Set => day_of_year + (18.0 - lng_hour) / 24.0,
    };

    // Mean anomaly and true longitude.
    let m = 0.9856 * t - 3.289;
    let l = (m + 1.916 * m.to_radians().sin() + 0.020 * (2.0 * m).to_radians().sin() + 282.634)
        .rem_euclid(360.0);

    // Right ascension, moved into the same quadrant as L, in hours.
    let ra = (0.91764 * l.to_radians().tan()).atan().to_degrees().rem_euclid(360.0);
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    let ra = (ra + l_quadrant - ra_quadrant) / 15.0;

    let sin_dec = 0.39782 * l.to_radians().sin();
    let cos_dec = sin_dec.asin().cos();

    let cos_h = (zenith.to_radians().cos() - sin_dec * latitude.to_radians().sin())
        / (cos_dec * latitude.to_radians().cos());
    if cos_h > 1.0 {
        return Err(SolarError::PolarNight);
    }
    if cos_h < -1.0 {
        return Err(SolarError::PolarDay);
    }
    if !cos_h.is_finite() {
        return Err(SolarError::InvalidLocation);
    }

    let h = match horizon {
        Horizon::Rise => 360.0 - cos_h.acos().to_degrees(),
        Horizon::Set => cos_h.acos().to_degrees(),
    } / 15.0;

    let local_mean = h + ra - 0.06571 * t - 6.622;
    let ut = (local_mean - lng_hour).rem_euclid(24.0);

    Ok(((ut + utc_offset) * 60.0).rem_euclid(f64::from(MINUTES_PER_DAY)))
}
