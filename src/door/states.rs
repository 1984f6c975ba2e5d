//! Door state handlers and table builder.
//!
//! ```text
//!                 request(On)                 travel elapsed
//!   IDLE_* ─────────────────────▶ MOVING_OPEN ───────────────▶ IDLE_OPEN
//!     │                            ▲      │
//!     │ request(Off)   request(On) │      │ request(Off)
//!     ▼                            │      ▼
//!   MOVING_CLOSED ◀────────────────┴──────┘
//!     │ travel elapsed
//!     ▼
//!   IDLE_CLOSED (lock engage)
//! ```

use embedded_hal::digital::OutputPin;

use super::context::DoorContext;
use super::{DoorMotion, StateDescriptor};
use crate::devices::DeviceState;
use crate::drivers::hbridge::Direction;
use crate::error::HwError;
use crate::time::elapsed_ms;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table<P: OutputPin>() -> [StateDescriptor<P>; DoorMotion::COUNT] {
    [
        StateDescriptor {
            id: DoorMotion::IdleUnknown,
            on_enter: None,
            on_exit: None,
            on_update: idle_update::<P>,
        },
        StateDescriptor {
            id: DoorMotion::IdleOpen,
            on_enter: Some(idle_open_enter::<P>),
            on_exit: None,
            on_update: idle_update::<P>,
        },
        StateDescriptor {
            id: DoorMotion::IdleClosed,
            on_enter: Some(idle_closed_enter::<P>),
            on_exit: None,
            on_update: idle_update::<P>,
        },
        StateDescriptor {
            id: DoorMotion::MovingOpen,
            on_enter: Some(moving_open_enter::<P>),
            on_exit: Some(moving_exit::<P>),
            on_update: moving_open_update::<P>,
        },
        StateDescriptor {
            id: DoorMotion::MovingClosed,
            on_enter: Some(moving_closed_enter::<P>),
            on_exit: Some(moving_exit::<P>),
            on_update: moving_closed_update::<P>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE states
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update<P: OutputPin>(_ctx: &mut DoorContext<P>) -> Option<DoorMotion> {
    None
}

fn idle_open_enter<P: OutputPin>(ctx: &mut DoorContext<P>) -> Result<(), HwError> {
    ctx.settled = DeviceState::On;
    Ok(())
}

fn idle_closed_enter<P: OutputPin>(ctx: &mut DoorContext<P>) -> Result<(), HwError> {
    ctx.settled = DeviceState::Off;
    ctx.lock.engage().map(|_| ())
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOVING states
// ═══════════════════════════════════════════════════════════════════════════

fn start_motion<P: OutputPin>(ctx: &mut DoorContext<P>, dir: Direction) -> Result<(), HwError> {
    // Never drive against an engaged lock.
    ctx.lock.release()?;
    ctx.motor.drive(dir)?;
    ctx.motion_t0 = None;
    Ok(())
}

fn moving_open_enter<P: OutputPin>(ctx: &mut DoorContext<P>) -> Result<(), HwError> {
    start_motion(ctx, Direction::Forward)
}

fn moving_closed_enter<P: OutputPin>(ctx: &mut DoorContext<P>) -> Result<(), HwError> {
    start_motion(ctx, Direction::Reverse)
}

fn moving_exit<P: OutputPin>(ctx: &mut DoorContext<P>) -> Result<(), HwError> {
    ctx.motion_t0 = None;
    ctx.motor.stop()
}

/// `true` once the configured travel time has passed since the first
/// tick of this motion.
fn travel_complete<P>(ctx: &mut DoorContext<P>) -> bool {
    match ctx.motion_t0 {
        None => {
            ctx.motion_t0 = Some(ctx.now_ms);
            false
        }
        Some(t0) => elapsed_ms(ctx.now_ms, t0) >= ctx.travel_ms,
    }
}

fn moving_open_update<P: OutputPin>(ctx: &mut DoorContext<P>) -> Option<DoorMotion> {
    travel_complete(ctx).then_some(DoorMotion::IdleOpen)
}

fn moving_closed_update<P: OutputPin>(ctx: &mut DoorContext<P>) -> Option<DoorMotion> {
    travel_complete(ctx).then_some(DoorMotion::IdleClosed)
}
