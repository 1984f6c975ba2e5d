//! Trigger resolution: declarative reference → minute-of-day.

use core::fmt;

use crate::solar::SolarTimes;
use crate::time::wrap_minutes;

use super::{Action, TimeRef, When};

/// Why a trigger produced no minute today. Never fatal: the event simply
/// takes no part in scheduling for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Reference is [`TimeRef::Disabled`].
    Disabled,
    /// Solar reference with no solar data (no location, unset clock,
    /// polar day/night).
    NoSolarData,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::NoSolarData => write!(f, "no solar data"),
        }
    }
}

/// Resolve `when` for an event commanding `action`.
pub fn resolve(when: &When, action: Action, solar: Option<&SolarTimes>) -> Result<u16, Unresolved> {
    let base = match when.reference {
        TimeRef::Disabled => return Err(Unresolved::Disabled),
        TimeRef::Midnight => 0,
        TimeRef::SolarStandard => {
            let s = solar.ok_or(Unresolved::NoSolarData)?;
            match action {
                Action::Activate => s.sunrise_std,
                Action::Deactivate => s.sunset_std,
            }
        }
        TimeRef::SolarCivil => {
            let s = solar.ok_or(Unresolved::NoSolarData)?;
            match action {
                Action::Activate => s.sunrise_civil,
                Action::Deactivate => s.sunset_civil,
            }
        }
    };
    Ok(wrap_minutes(i32::from(base) + i32::from(when.offset_minutes)))
}
