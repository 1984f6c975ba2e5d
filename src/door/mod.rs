//! Door motion state machine.
//!
//! Table-driven, one row per motion state:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ DoorMotion   │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├──────────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ IdleUnknown  │ —         │ —        │ stay              │ │
//! │  │ IdleOpen     │ settle    │ —        │ stay              │ │
//! │  │ IdleClosed   │ settle    │ —        │ stay              │ │
//! │  │ MovingOpen   │ unlock+go │ stop     │ travel timer      │ │
//! │  │ MovingClosed │ unlock+go │ stop     │ travel timer      │ │
//! │  └──────────────┴───────────┴──────────┴───────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests come from [`Door::request`]; travel completion comes from
//! `on_update` during [`Door::tick`]. There is no separate cancel: a new
//! request in the other direction is the abort.
//!
//! Any pin error inside a handler stops the motor and drops the machine
//! to `IdleUnknown`, since the door position can no longer be trusted.

pub mod context;
pub mod states;

use core::fmt;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info};

use crate::devices::DeviceState;
use crate::drivers::hbridge::HBridge;
use crate::error::HwError;
use crate::safety::LockActuator;

use context::DoorContext;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Motion state. Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorMotion {
    IdleUnknown = 0,
    IdleOpen = 1,
    IdleClosed = 2,
    MovingOpen = 3,
    MovingClosed = 4,
}

impl DoorMotion {
    pub const COUNT: usize = 5;

    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::IdleOpen,
            2 => Self::IdleClosed,
            3 => Self::MovingOpen,
            4 => Self::MovingClosed,
            _ => Self::IdleUnknown,
        }
    }

    pub const fn is_moving(self) -> bool {
        matches!(self, Self::MovingOpen | Self::MovingClosed)
    }
}

impl fmt::Display for DoorMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IdleUnknown => "idle-unknown",
            Self::IdleOpen => "idle-open",
            Self::IdleClosed => "idle-closed",
            Self::MovingOpen => "moving-open",
            Self::MovingClosed => "moving-closed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action. Runs once per transition.
pub type StateActionFn<P> = fn(&mut DoorContext<P>) -> Result<(), HwError>;

/// Per-tick handler. `Some(next)` requests a transition.
pub type StateUpdateFn<P> = fn(&mut DoorContext<P>) -> Option<DoorMotion>;

/// One row of the state table.
pub struct StateDescriptor<P> {
    pub id: DoorMotion,
    pub on_enter: Option<StateActionFn<P>>,
    pub on_exit: Option<StateActionFn<P>>,
    pub on_update: StateUpdateFn<P>,
}

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

/// The door device: motor bridge, lock, and motion FSM.
pub struct Door<P> {
    table: [StateDescriptor<P>; DoorMotion::COUNT],
    current: usize,
    ctx: DoorContext<P>,
}

impl<P: OutputPin> Door<P> {
    pub fn new(motor: HBridge<P>, lock: LockActuator<P>, travel_ms: u32) -> Self {
        Self {
            table: states::build_state_table(),
            current: DoorMotion::IdleUnknown as usize,
            ctx: DoorContext::new(motor, lock, travel_ms),
        }
    }

    /// Hardware to a safe state: motor stopped, lock de-energized,
    /// position unknown.
    pub fn start(&mut self) -> Result<(), HwError> {
        self.current = DoorMotion::IdleUnknown as usize;
        self.ctx.settled = DeviceState::Unknown;
        self.ctx.motion_t0 = None;
        info!("door: starting in {}", self.motion());
        let motor = self.ctx.motor.stop();
        let lock = self.ctx.lock.init();
        motor.and(lock)
    }

    /// Ask for `On` (open) or `Off` (closed).
    ///
    /// A request matching the current motion is ignored. Anything else
    /// stops the motor and starts moving toward the target.
    pub fn request(&mut self, target: DeviceState) -> Result<(), HwError> {
        let next = match target {
            DeviceState::On => DoorMotion::MovingOpen,
            DeviceState::Off => DoorMotion::MovingClosed,
            DeviceState::Unknown => {
                debug!("door: ignoring request for unknown state");
                return Ok(());
            }
        };
        if self.motion() == next {
            debug!("door: already {next}");
            return Ok(());
        }
        self.transition(next)
    }

    /// Advance the lock pulse and the travel timer.
    pub fn tick(&mut self, now_ms: u32) -> Result<(), HwError> {
        self.ctx.now_ms = now_ms;
        let lock = self.ctx.lock.tick(now_ms);

        if let Some(next) = (self.table[self.current].on_update)(&mut self.ctx) {
            self.transition(next)?;
        }
        lock
    }

    pub fn motion(&self) -> DoorMotion {
        DoorMotion::from_index(self.current)
    }

    /// Last settled position; unchanged while moving.
    pub fn state(&self) -> DeviceState {
        self.ctx.settled
    }

    pub fn lock(&self) -> &LockActuator<P> {
        &self.ctx.lock
    }

    pub fn lock_mut(&mut self) -> &mut LockActuator<P> {
        &mut self.ctx.lock
    }

    pub fn travel_ms(&self) -> u32 {
        self.ctx.travel_ms
    }

    /// Takes effect from the next travel-timer comparison.
    pub fn set_travel_ms(&mut self, travel_ms: u32) {
        self.ctx.travel_ms = travel_ms;
    }

    pub fn is_motor_energized(&self) -> bool {
        self.ctx.motor.is_energized()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: DoorMotion) -> Result<(), HwError> {
        let next_idx = next as usize;
        info!("door: {} -> {}", self.motion(), next);

        if let Some(exit) = self.table[self.current].on_exit {
            if let Err(e) = exit(&mut self.ctx) {
                return Err(self.fault(e));
            }
        }

        self.current = next_idx;
        debug_assert_eq!(self.table[next_idx].id, next);

        if let Some(enter) = self.table[self.current].on_enter {
            if let Err(e) = enter(&mut self.ctx) {
                return Err(self.fault(e));
            }
        }
        Ok(())
    }

    fn fault(&mut self, e: HwError) -> HwError {
        error!("door: {e} in {}, stopping", self.motion());
        let _ = self.ctx.motor.stop();
        self.ctx.motion_t0 = None;
        self.ctx.settled = DeviceState::Unknown;
        self.current = DoorMotion::IdleUnknown as usize;
        e
    }
}
