//! Device registry: the closed set of schedulable outputs.
//!
//! | Id | Name     | Kind  | `On` means     |
//! |----|----------|-------|----------------|
//! | 0  | `door`   | Door  | open           |
//! | 1  | `lock`   | Lock  | locked         |
//! | 2  | `relay1` | Relay | coil energized |
//! | 3  | `relay2` | Relay | coil energized |
//!
//! Dispatch is a `match` on [`DeviceKind`], so there are no trait objects
//! and no per-device function tables. The lock is physically part of the
//! door assembly; the registry reaches it through the door so that the
//! door FSM stays its only owner.

use core::fmt;

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::app::ports::DevicePort;
use crate::door::Door;
use crate::drivers::relay::Relay;
use crate::error::{Error, Result};

/// Registry index of a device.
pub type DeviceId = u8;

/// Upper bound on device identifiers accepted by the event table.
pub const MAX_DEVICES: usize = 8;

pub const DOOR: DeviceId = 0;
pub const LOCK: DeviceId = 1;
pub const RELAY_1: DeviceId = 2;
pub const RELAY_2: DeviceId = 3;

/// Externally visible device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    #[default]
    Unknown,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Door,
    Lock,
    Relay(usize),
}

struct Entry {
    id: DeviceId,
    name: &'static str,
    kind: DeviceKind,
}

const REGISTRY: [Entry; 4] = [
    Entry { id: DOOR, name: "door", kind: DeviceKind::Door },
    Entry { id: LOCK, name: "lock", kind: DeviceKind::Lock },
    Entry { id: RELAY_1, name: "relay1", kind: DeviceKind::Relay(0) },
    Entry { id: RELAY_2, name: "relay2", kind: DeviceKind::Relay(1) },
];

/// Case-insensitive name lookup.
pub fn lookup(name: &str) -> Option<DeviceId> {
    REGISTRY.iter().find(|e| e.name.eq_ignore_ascii_case(name)).map(|e| e.id)
}

pub fn name(id: DeviceId) -> Option<&'static str> {
    entry(id).map(|e| e.name)
}

pub fn kind(id: DeviceId) -> Option<DeviceKind> {
    entry(id).map(|e| e.kind)
}

fn entry(id: DeviceId) -> Option<&'static Entry> {
    REGISTRY.iter().find(|e| e.id == id)
}

/// Human label for a state of a given kind of device.
pub fn state_label(kind: DeviceKind, state: DeviceState) -> &'static str {
    match (kind, state) {
        (_, DeviceState::Unknown) => "UNKNOWN",
        (DeviceKind::Door, DeviceState::On) => "OPEN",
        (DeviceKind::Door, DeviceState::Off) => "CLOSED",
        (DeviceKind::Lock, DeviceState::On) => "LOCKED",
        (DeviceKind::Lock, DeviceState::Off) => "UNLOCKED",
        (DeviceKind::Relay(_), DeviceState::On) => "ON",
        (DeviceKind::Relay(_), DeviceState::Off) => "OFF",
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct DeviceRegistry<P> {
    door: Door<P>,
    relays: [Relay<P>; 2],
}

impl<P: OutputPin> DeviceRegistry<P> {
    pub fn new(door: Door<P>, relays: [Relay<P>; 2]) -> Self {
        Self { door, relays }
    }

    /// Every output to its safe state: motor and lock de-energized,
    /// relays off. Attempts every device even if one fails.
    pub fn init(&mut self) -> Result<()> {
        let mut result = self.door.start().map_err(Error::from);
        for relay in &mut self.relays {
            if let Err(e) = relay.set(DeviceState::Off) {
                warn!("devices: relay init failed: {e}");
                result = result.and(Err(e.into()));
            }
        }
        result
    }

    /// Advance every device's timers.
    pub fn tick(&mut self, now_ms: u32) -> Result<()> {
        self.door.tick(now_ms).map_err(Error::from)
    }

    pub fn door(&self) -> &Door<P> {
        &self.door
    }

    pub fn door_mut(&mut self) -> &mut Door<P> {
        &mut self.door
    }
}

impl<P: OutputPin> DevicePort for DeviceRegistry<P> {
    fn device_ids(&self) -> heapless::Vec<DeviceId, MAX_DEVICES> {
        REGISTRY.iter().map(|e| e.id).collect()
    }

    fn state(&self, id: DeviceId) -> Option<DeviceState> {
        Some(match kind(id)? {
            DeviceKind::Door => self.door.state(),
            DeviceKind::Lock => self.door.lock().state(),
            DeviceKind::Relay(n) => self.relays.get(n)?.state(),
        })
    }

    fn set_state(&mut self, id: DeviceId, state: DeviceState) -> Result<()> {
        let kind = kind(id).ok_or(Error::UnknownDevice(id))?;
        debug!("devices: {} <- {}", name(id).unwrap_or("?"), state);
        match kind {
            DeviceKind::Door => self.door.request(state)?,
            DeviceKind::Lock => {
                let accepted = match state {
                    DeviceState::On => self.door.lock_mut().engage()?,
                    DeviceState::Off => self.door.lock_mut().release()?,
                    DeviceState::Unknown => true,
                };
                if !accepted {
                    debug!("devices: lock busy, {state} dropped");
                }
            }
            DeviceKind::Relay(n) => {
                self.relays.get_mut(n).ok_or(Error::UnknownDevice(id))?.set(state)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::DoorMotion;
    use crate::drivers::sim::{SimPin, WriteLog, bridge};
    use crate::safety::LockActuator;

    fn registry() -> (DeviceRegistry<SimPin>, [SimPin; 2]) {
        let (motor, _) = bridge();
        let (lock, _) = bridge();
        let log = WriteLog::default();
        let r1 = SimPin::new("relay1", log.clone());
        let r2 = SimPin::new("relay2", log);
        let door = Door::new(motor, LockActuator::new(lock), 1_000);
        let mut reg = DeviceRegistry::new(door, [Relay::new(r1.clone()), Relay::new(r2.clone())]);
        reg.init().unwrap();
        (reg, [r1, r2])
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("door"), Some(DOOR));
        assert_eq!(lookup("RELAY2"), Some(RELAY_2));
        assert_eq!(lookup("foo"), None);
        assert_eq!(name(LOCK), Some("lock"));
    }

    #[test]
    fn init_turns_relays_off() {
        let (reg, _) = registry();
        assert_eq!(reg.state(RELAY_1), Some(DeviceState::Off));
        assert_eq!(reg.state(DOOR), Some(DeviceState::Unknown));
        assert_eq!(reg.device_ids().as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn relay_set_state() {
        let (mut reg, pins) = registry();
        reg.set_state(RELAY_2, DeviceState::On).unwrap();
        assert!(pins[1].is_high());
        assert_eq!(reg.state(RELAY_2), Some(DeviceState::On));
    }

    #[test]
    fn door_request_dispatches_to_fsm() {
        let (mut reg, _) = registry();
        reg.set_state(DOOR, DeviceState::Off).unwrap();
        assert_eq!(reg.door().motion(), DoorMotion::MovingClosed);
    }

    #[test]
    fn lock_dispatch_and_completion() {
        let (mut reg, _) = registry();
        reg.set_state(LOCK, DeviceState::On).unwrap();
        reg.tick(0).unwrap();
        reg.tick(500).unwrap();
        assert_eq!(reg.state(LOCK), Some(DeviceState::On));
    }

    #[test]
    fn unknown_device_is_an_error() {
        let (mut reg, _) = registry();
        assert_eq!(reg.state(7), None);
        assert_eq!(reg.set_state(7, DeviceState::On), Err(Error::UnknownDevice(7)));
    }

    #[test]
    fn labels() {
        assert_eq!(state_label(DeviceKind::Door, DeviceState::On), "OPEN");
        assert_eq!(state_label(DeviceKind::Lock, DeviceState::Off), "UNLOCKED");
    }
}
