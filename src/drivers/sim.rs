//! Simulated output pins for driver and FSM unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use super::hbridge::HBridge;

/// Shared record of every pin write, in order: `(pin name, level)`.
pub type WriteLog = Rc<RefCell<Vec<(&'static str, bool)>>>;

#[derive(Debug)]
pub struct SimPinError;

impl embedded_hal::digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Clone)]
pub struct SimPin {
    name: &'static str,
    level: Rc<Cell<bool>>,
    fail: Rc<Cell<bool>>,
    log: WriteLog,
}

impl SimPin {
    pub fn new(name: &'static str, log: WriteLog) -> Self {
        Self { name, level: Rc::default(), fail: Rc::default(), log }
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    /// Make every subsequent write return an error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn log(&self) -> WriteLog {
        Rc::clone(&self.log)
    }

    fn write(&mut self, high: bool) -> Result<(), SimPinError> {
        if self.fail.get() {
            return Err(SimPinError);
        }
        self.level.set(high);
        self.log.borrow_mut().push((self.name, high));
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// An H-bridge on fresh pins, plus handles to observe `[ina, inb, en]`.
pub fn bridge() -> (HBridge<SimPin>, [SimPin; 3]) {
    let log = WriteLog::default();
    let pins = [
        SimPin::new("ina", Rc::clone(&log)),
        SimPin::new("inb", Rc::clone(&log)),
        SimPin::new("en", log),
    ];
    let [ina, inb, en] = pins.clone();
    (HBridge::new(ina, inb, en), pins)
}
