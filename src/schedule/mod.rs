//! Declarative event scheduling.
//!
//! ```text
//!  EventStore ──mutation──▶ ScheduleObserver (Scheduler::touch → etag++)
//!      │
//!      │ table()                     Scheduler (DayContext + etag)
//!      ▼                                   │ solar()
//!  reducer::reduce(table, solar, now) ◀────┘
//!      │ ReducedState
//!      ▼
//!  apply::apply(reduced, DevicePort)  ──▶ door / lock / relays
//! ```
//!
//! Every piece here is pure or owns plain data; hardware and time come in
//! through [`crate::app::ports`].

pub mod apply;
pub mod reducer;
pub mod resolve;
pub mod scheduler;
pub mod store;

use core::fmt;
use core::num::NonZeroU8;

use serde::{Deserialize, Serialize};

use crate::devices::{DeviceId, DeviceState};

pub use resolve::{Unresolved, resolve};
pub use scheduler::{NextEvent, Scheduler};
pub use store::EventStore;

/// Capacity of the event table.
pub const MAX_EVENTS: usize = 16;

/// Backing storage of the event table: one optional entry per slot.
pub type EventTable = [Option<Event>; MAX_EVENTS];

// ---------------------------------------------------------------------------
// Trigger reference
// ---------------------------------------------------------------------------

/// What an event's offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRef {
    /// Event is disabled; it never resolves.
    #[default]
    Disabled,
    /// Offset from 00:00.
    Midnight,
    /// Offset from official sunrise (activate) or sunset (deactivate).
    SolarStandard,
    /// Offset from civil dawn (activate) or dusk (deactivate).
    SolarCivil,
}

/// A trigger: a reference point plus a signed minute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct When {
    pub reference: TimeRef,
    pub offset_minutes: i16,
}

impl When {
    pub const fn midnight(offset_minutes: i16) -> Self {
        Self { reference: TimeRef::Midnight, offset_minutes }
    }

    pub const fn solar(offset_minutes: i16) -> Self {
        Self { reference: TimeRef::SolarStandard, offset_minutes }
    }

    pub const fn civil(offset_minutes: i16) -> Self {
        Self { reference: TimeRef::SolarCivil, offset_minutes }
    }

    /// Wall-clock trigger at `hour:minute`.
    pub const fn at(hour: u8, minute: u8) -> Self {
        Self::midnight(hour as i16 * 60 + minute as i16)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Commanded action. Activate is the "open" direction: it selects sunrise
/// for solar references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Activate,
    Deactivate,
}

impl Action {
    pub const fn desired_state(self) -> DeviceState {
        match self {
            Self::Activate => DeviceState::On,
            Self::Deactivate => DeviceState::Off,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => write!(f, "on"),
            Self::Deactivate => write!(f, "off"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event identity and entries
// ---------------------------------------------------------------------------

/// Stable identity of a live event: creation slot + 1, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(NonZeroU8);

impl EventId {
    /// Identity for an event created in `slot`.
    pub fn for_slot(slot: usize) -> Option<Self> {
        u8::try_from(slot + 1).ok().and_then(NonZeroU8::new).map(Self)
    }

    /// Parse a user-facing reference number; `0` is never an identity.
    pub fn new(raw: u8) -> Option<Self> {
        NonZeroU8::new(raw).map(Self)
    }

    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The user-editable part of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub device: DeviceId,
    pub when: When,
    pub action: Action,
}

/// A live table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub device: DeviceId,
    pub when: When,
    pub action: Action,
}

impl Event {
    pub const fn spec(&self) -> EventSpec {
        EventSpec { device: self.device, when: self.when, action: self.action }
    }
}
