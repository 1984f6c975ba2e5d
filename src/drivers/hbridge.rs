//! Three-wire H-bridge driver (INA / INB / EN).
//!
//! Used for both the door motor and the lock solenoid.
//!
//! | INA | INB | EN | Effect   |
//! |-----|-----|----|----------|
//! |  1  |  0  | 1  | Forward  |
//! |  0  |  1  | 1  | Reverse  |
//! |  x  |  x  | 0  | Coasting |
//!
//! ## Safety contract
//!
//! Direction pins are only changed while EN is low, and `stop` always
//! drops EN before touching direction. The driver itself has no timing;
//! callers (door FSM, lock actuator) bound how long it stays energized.

use embedded_hal::digital::OutputPin;

use crate::error::HwError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

pub struct HBridge<P> {
    ina: P,
    inb: P,
    en: P,
    driving: Option<Direction>,
}

impl<P: OutputPin> HBridge<P> {
    /// Wrap the three output pins. Pin levels are untouched until
    /// [`stop`](Self::stop) or [`drive`](Self::drive) is called.
    pub fn new(ina: P, inb: P, en: P) -> Self {
        Self { ina, inb, en, driving: None }
    }

    /// Set direction, then enable power.
    pub fn drive(&mut self, dir: Direction) -> Result<(), HwError> {
        self.en.set_low().map_err(HwError::from_pin)?;
        match dir {
            Direction::Forward => {
                self.inb.set_low().map_err(HwError::from_pin)?;
                self.ina.set_high().map_err(HwError::from_pin)?;
            }
            Direction::Reverse => {
                self.ina.set_low().map_err(HwError::from_pin)?;
                self.inb.set_high().map_err(HwError::from_pin)?;
            }
        }
        self.en.set_high().map_err(HwError::from_pin)?;
        self.driving = Some(dir);
        Ok(())
    }

    /// Power off, then neutral direction.
    pub fn stop(&mut self) -> Result<(), HwError> {
        self.en.set_low().map_err(HwError::from_pin)?;
        self.driving = None;
        self.ina.set_low().map_err(HwError::from_pin)?;
        self.inb.set_low().map_err(HwError::from_pin)
    }

    /// Direction currently powered, if any.
    pub fn driving(&self) -> Option<Direction> {
        self.driving
    }

    pub fn is_energized(&self) -> bool {
        self.driving.is_some()
    }
}
