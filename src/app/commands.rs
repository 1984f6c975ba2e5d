//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (configuration
//! console, provisioning) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::config::Location;
use crate::devices::{DeviceId, DeviceState};
use crate::schedule::{EventId, EventSpec};
use crate::time::DstPolicy;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Add a scheduled event; replies with its identity.
    AddEvent(EventSpec),

    /// Replace an event's contents, keeping its identity.
    UpdateEvent(EventId, EventSpec),

    DeleteEvent(EventId),

    /// Remove every scheduled event.
    ClearEvents,

    /// Set or clear the site location. `None` disables solar events.
    SetLocation(Option<Location>),

    /// Standard-time UTC offset, hours.
    SetUtcOffset(i8),

    SetDstPolicy(DstPolicy),

    /// Full door travel time, ms.
    SetDoorTravel(u32),

    /// Drive a device directly, outside the schedule.
    SetDevice { id: DeviceId, state: DeviceState },

    /// The wall clock was set by hand; today's solar cache is stale.
    ClockAdjusted,

    /// Persist the configuration on the next save check.
    SaveConfig,
}

/// Successful outcome of an [`AppCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReply {
    Done,
    EventAdded(EventId),
}
