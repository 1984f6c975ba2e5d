//! Backward-looking reduction of the event table to one desired action
//! per device.
//!
//! For each device, the event with the largest resolved minute that is
//! not in the future wins: the most recent instruction not yet
//! superseded. On an exact tie the entry later in table order wins.
//! Resolution is date-naive; an event at 23:50 does not apply at 00:05.

use crate::devices::{DeviceId, MAX_DEVICES};
use crate::solar::SolarTimes;

use super::resolve::resolve;
use super::{Action, Event};

/// Desired action per device, produced fresh by every [`reduce`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReducedState {
    actions: [Option<Action>; MAX_DEVICES],
}

impl ReducedState {
    pub fn action(&self, device: DeviceId) -> Option<Action> {
        self.actions.get(usize::from(device)).copied().flatten()
    }

    /// Devices that have an action, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, Action)> + '_ {
        self.actions
            .iter()
            .enumerate()
            .filter_map(|(id, a)| a.map(|a| (id as DeviceId, a)))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.iter().all(Option::is_none)
    }
}

/// Reduce the sparse `table` at `now_minute`.
pub fn reduce(table: &[Option<Event>], solar: Option<&SolarTimes>, now_minute: u16) -> ReducedState {
    let mut best: [Option<(u16, Action)>; MAX_DEVICES] = [None; MAX_DEVICES];

    for ev in table.iter().flatten() {
        let Some(slot) = best.get_mut(usize::from(ev.device)) else {
            continue;
        };
        let Ok(minute) = resolve(&ev.when, ev.action, solar) else {
            continue;
        };
        if minute > now_minute {
            continue;
        }
        // `>=` lets a later table entry take an exact tie.
        if slot.is_none_or(|(m, _)| minute >= m) {
            *slot = Some((minute, ev.action));
        }
    }

    ReducedState { actions: best.map(|b| b.map(|(_, action)| action)) }
}
