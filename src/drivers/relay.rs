//! Single-pin relay output (auxiliary loads: heat lamp, run light).
//!
//! A dumb actuator: the level is written immediately and the state is
//! only updated once the write succeeds.

use embedded_hal::digital::OutputPin;

use crate::devices::DeviceState;
use crate::error::HwError;

pub struct Relay<P> {
    pin: P,
    state: DeviceState,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, state: DeviceState::Unknown }
    }

    /// Drive the coil. `Unknown` de-energizes without claiming a state.
    pub fn set(&mut self, state: DeviceState) -> Result<(), HwError> {
        match state {
            DeviceState::On => self.pin.set_high().map_err(HwError::from_pin)?,
            DeviceState::Off | DeviceState::Unknown => self.pin.set_low().map_err(HwError::from_pin)?,
        }
        self.state = state;
        Ok(())
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }
}
