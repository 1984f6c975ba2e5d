//! Lock solenoid safety actuator.
//!
//! The solenoid is not self-limiting and there is no current sensing, so
//! the pulse length is the only thing protecting it. The actuator
//! enforces three rules:
//!
//! 1. A pulse never lasts longer than [`LOCK_PULSE_MS`] after it is armed.
//! 2. `engage` / `release` while a pulse is active are dropped, never
//!    queued, never extending or restarting the pulse.
//! 3. The pulse timer is armed by the first `tick` after the command,
//!    not at command time.
//!
//! ## Pulse lifecycle
//!
//! ```text
//!  idle ──engage/release──▶ energized (unarmed)
//!                              │ tick(now): t0 = now
//!                              ▼
//!                           energized (armed)
//!                              │ tick: now - t0 >= LOCK_PULSE_MS
//!                              ▼
//!                           bridge.stop() ──▶ idle, state = Locked/Unlocked
//! ```
//!
//! If the stop write fails the pulse stays active and the next tick
//! retries it.

use embedded_hal::digital::OutputPin;
use log::{debug, error, info};

use crate::devices::DeviceState;
use crate::drivers::hbridge::{Direction, HBridge};
use crate::error::HwError;
use crate::time::elapsed_ms;

/// Hard upper bound on solenoid energization, ms.
pub const LOCK_PULSE_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCommand {
    Engage,
    Release,
}

impl LockCommand {
    const fn direction(self) -> Direction {
        match self {
            Self::Engage => Direction::Forward,
            Self::Release => Direction::Reverse,
        }
    }

    const fn settled(self) -> DeviceState {
        match self {
            Self::Engage => DeviceState::On,
            Self::Release => DeviceState::Off,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pulse {
    command: LockCommand,
    armed_at: Option<u32>,
}

pub struct LockActuator<P> {
    bridge: HBridge<P>,
    pulse: Option<Pulse>,
    /// Result of the last completed pulse.
    state: DeviceState,
}

impl<P: OutputPin> LockActuator<P> {
    pub fn new(bridge: HBridge<P>) -> Self {
        Self { bridge, pulse: None, state: DeviceState::Unknown }
    }

    /// Safe default: de-energized, no pulse, state unknown.
    pub fn init(&mut self) -> Result<(), HwError> {
        self.pulse = None;
        self.state = DeviceState::Unknown;
        self.bridge.stop()
    }

    /// Start a locking pulse. Returns `false` if dropped because a pulse
    /// is already active.
    pub fn engage(&mut self) -> Result<bool, HwError> {
        self.command(LockCommand::Engage)
    }

    /// Start an unlocking pulse. Returns `false` if dropped because a
    /// pulse is already active.
    pub fn release(&mut self) -> Result<bool, HwError> {
        self.command(LockCommand::Release)
    }

    fn command(&mut self, command: LockCommand) -> Result<bool, HwError> {
        if let Some(active) = self.pulse {
            debug!("lock: {command:?} dropped, {:?} pulse active", active.command);
            return Ok(false);
        }
        if let Err(e) = self.bridge.drive(command.direction()) {
            error!("lock: {command:?} failed: {e}");
            // Leave nothing energized if the drive sequence stopped halfway.
            let _ = self.bridge.stop();
            return Err(e);
        }
        info!("lock: {command:?} pulse started");
        self.pulse = Some(Pulse { command, armed_at: None });
        Ok(true)
    }

    /// Advance the pulse timer. Call every control-loop iteration.
    pub fn tick(&mut self, now_ms: u32) -> Result<(), HwError> {
        let Some(pulse) = self.pulse.as_mut() else {
            return Ok(());
        };
        let Some(t0) = pulse.armed_at else {
            pulse.armed_at = Some(now_ms);
            return Ok(());
        };
        if elapsed_ms(now_ms, t0) < LOCK_PULSE_MS {
            return Ok(());
        }

        let command = pulse.command;
        self.bridge.stop()?;
        self.pulse = None;
        self.state = command.settled();
        info!("lock: {command:?} pulse complete");
        Ok(())
    }

    pub fn is_energized(&self) -> bool {
        self.bridge.is_energized()
    }

    pub fn is_busy(&self) -> bool {
        self.pulse.is_some()
    }

    /// `On` = locked, `Off` = unlocked, as of the last completed pulse.
    pub fn state(&self) -> DeviceState {
        self.state
    }
}
