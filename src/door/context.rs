//! Mutable context threaded through every door state handler.

use crate::devices::DeviceState;
use crate::drivers::hbridge::HBridge;
use crate::safety::LockActuator;

pub struct DoorContext<P> {
    /// Door motor bridge. Forward opens, reverse closes.
    pub motor: HBridge<P>,
    pub lock: LockActuator<P>,
    /// Configured full-travel time, ms.
    pub travel_ms: u32,
    /// Uptime of the tick being processed.
    pub now_ms: u32,
    /// Travel timer start; `None` until the first tick after a motion
    /// command.
    pub motion_t0: Option<u32>,
    /// Externally visible position: `On` open, `Off` closed.
    pub settled: DeviceState,
}

impl<P> DoorContext<P> {
    pub fn new(motor: HBridge<P>, lock: LockActuator<P>, travel_ms: u32) -> Self {
        Self {
            motor,
            lock,
            travel_ms,
            now_ms: 0,
            motion_t0: None,
            settled: DeviceState::Unknown,
        }
    }
}
