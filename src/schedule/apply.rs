//! Idempotent convergence of live device state toward a [`ReducedState`].
//!
//! A command is issued only when a device's current state differs from
//! the desired one, so applying the same reduction every tick is safe.
//! The applier keeps no state and does no timing.

use log::{info, warn};

use crate::app::ports::DevicePort;

use super::reducer::ReducedState;

/// Converge `devices` toward `reduced`. Returns the number of commands
/// issued.
pub fn apply(reduced: &ReducedState, devices: &mut impl DevicePort) -> usize {
    let mut issued = 0;
    for (id, action) in reduced.iter() {
        let desired = action.desired_state();
        let Some(current) = devices.state(id) else {
            // Scheduled for a device this build does not have.
            continue;
        };
        if current == desired {
            continue;
        }
        match devices.set_state(id, desired) {
            Ok(()) => {
                info!("apply: device {id} {current:?} -> {desired:?}");
                issued += 1;
            }
            Err(e) => warn!("apply: device {id} -> {desired:?} failed: {e}"),
        }
    }
    issued
}
