//! Door status LED pattern selection.
//!
//! Presentation only; nothing here feeds back into control decisions.
//!
//! ## Priority (highest first)
//!
//! 1. **Clock unset**: red blink (2 Hz): schedules cannot run.
//! 2. **Door moving**: green blink (2 Hz).
//! 3. **Door settled unknown**: solid red.
//! 4. Otherwise off, to save power.

use crate::door::DoorMotion;

/// Half-period of the blink patterns, ms.
pub const BLINK_HALF_PERIOD_MS: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Off,
    Solid(Colour),
    Blink(Colour),
}

impl Pattern {
    /// Choose the pattern for the current door motion and clock validity.
    pub fn select(motion: DoorMotion, clock_valid: bool) -> Self {
        if !clock_valid {
            return Self::Blink(Colour::Red);
        }
        match motion {
            DoorMotion::MovingOpen | DoorMotion::MovingClosed => Self::Blink(Colour::Green),
            DoorMotion::IdleUnknown => Self::Solid(Colour::Red),
            DoorMotion::IdleOpen | DoorMotion::IdleClosed => Self::Off,
        }
    }

    /// Colour lit at `phase_ms` into the pattern, or `None` when dark.
    pub fn output(self, phase_ms: u32) -> Option<Colour> {
        match self {
            Self::Off => None,
            Self::Solid(c) => Some(c),
            Self::Blink(c) => ((phase_ms / BLINK_HALF_PERIOD_MS) % 2 == 0).then_some(c),
        }
    }
}
