//! Pin-level actuator drivers, generic over `embedded_hal` output pins.

pub mod hbridge;
pub mod indicator;
pub mod relay;

#[cfg(test)]
pub(crate) mod sim;
