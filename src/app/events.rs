//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

use chrono::NaiveDate;

use crate::door::DoorMotion;
use crate::error::Error;
use crate::solar::SolarTimes;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Service started; `restored` is false when defaults were substituted.
    Started { restored: bool, events: usize },

    /// A new day context was installed.
    DayChanged { date: NaiveDate, solar: Option<SolarTimes> },

    /// A reduction ran and `commands` device commands were issued.
    ScheduleApplied { minute: u16, commands: usize },

    /// The door changed motion state.
    DoorMotion { from: DoorMotion, to: DoorMotion },

    /// The RTC has no valid time; scheduling is suspended.
    ClockUnset,

    /// Valid time is back after being unset.
    ClockRestored,

    /// A device tick or command failed.
    Fault(Error),

    /// Configuration was written to storage.
    ConfigSaved,
}
