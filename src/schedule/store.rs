//! Fixed-capacity sparse event table.
//!
//! Slots are `Option<Event>`; a free slot is `None`. An event's identity
//! is assigned once at creation (creation slot + 1) and stored inside the
//! entry. There is no compaction, so an identity stays valid until the
//! event is deleted, and callers look events up by identity rather than
//! by slot position.
//!
//! Every successful mutation notifies the injected [`ScheduleObserver`]
//! exactly once; failed mutations change nothing and notify nothing.

use log::{debug, info, warn};

use crate::app::ports::ScheduleObserver;
use crate::devices::MAX_DEVICES;
use crate::error::StoreError;

use super::{Event, EventId, EventSpec, EventTable, MAX_EVENTS};

/// Owner of the event table. Everything else gets read-only views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStore {
    slots: EventTable,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    /// Empty table.
    pub const fn new() -> Self {
        Self { slots: [None; MAX_EVENTS] }
    }

    /// Adopt a table loaded from persistent storage.
    ///
    /// Entries whose identity does not match their slot, or that name a
    /// device outside the registry, are dropped.
    pub fn restore(table: EventTable) -> Self {
        let mut slots = table;
        for (idx, slot) in slots.iter_mut().enumerate() {
            let Some(ev) = slot else { continue };
            if Some(ev.id) != EventId::for_slot(idx) || usize::from(ev.device) >= MAX_DEVICES {
                warn!("event store: dropping inconsistent entry in slot {idx}");
                *slot = None;
            }
        }
        Self { slots }
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Place a new event in the first free slot.
    pub fn add(
        &mut self,
        spec: EventSpec,
        observer: &mut dyn ScheduleObserver,
    ) -> Result<EventId, StoreError> {
        validate(&spec)?;
        let (idx, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.is_none())
            .ok_or(StoreError::TableFull)?;
        let id = EventId::for_slot(idx).ok_or(StoreError::TableFull)?;

        *slot = Some(Event { id, device: spec.device, when: spec.when, action: spec.action });
        info!("event store: added {id} (device {} {})", spec.device, spec.action);
        observer.on_schedule_changed();
        Ok(id)
    }

    /// Replace an event's contents in place; its identity is preserved.
    pub fn update(
        &mut self,
        id: EventId,
        spec: EventSpec,
        observer: &mut dyn ScheduleObserver,
    ) -> Result<(), StoreError> {
        validate(&spec)?;
        let ev = self.find_mut(id).ok_or(StoreError::NotFound)?;
        ev.device = spec.device;
        ev.when = spec.when;
        ev.action = spec.action;
        info!("event store: updated {id}");
        observer.on_schedule_changed();
        Ok(())
    }

    /// Free the slot holding `id`.
    pub fn delete(&mut self, id: EventId, observer: &mut dyn ScheduleObserver) -> Result<(), StoreError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.is_some_and(|ev| ev.id == id))
            .ok_or(StoreError::NotFound)?;
        *slot = None;
        info!("event store: deleted {id}");
        observer.on_schedule_changed();
        Ok(())
    }

    /// Free every slot. Notifies once, even for an already-empty table.
    pub fn clear(&mut self, observer: &mut dyn ScheduleObserver) {
        self.slots = [None; MAX_EVENTS];
        info!("event store: cleared");
        observer.on_schedule_changed();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.iter().find(|ev| ev.id == id)
    }

    /// Live events in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        MAX_EVENTS
    }

    /// Read-only view of the full sparse table.
    pub fn table(&self) -> &EventTable {
        &self.slots
    }

    fn find_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.slots.iter_mut().flatten().find(|ev| ev.id == id)
    }
}

fn validate(spec: &EventSpec) -> Result<(), StoreError> {
    if usize::from(spec.device) >= MAX_DEVICES {
        debug!("event store: rejecting device {}", spec.device);
        return Err(StoreError::InvalidDevice);
    }
    Ok(())
}
