//! Unified error types for the coop door firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! control loop handles failures uniformly. All variants are `Copy` so
//! they can be passed through the service and emitted as events without
//! allocation.

use core::fmt;

use embedded_hal::digital::ErrorKind;

use crate::app::ports::ConfigError;
use crate::devices::DeviceId;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The event table rejected a mutation.
    Store(StoreError),
    /// Solar times are not available for the requested day.
    Solar(SolarError),
    /// A pin write failed.
    Hardware(HwError),
    /// Configuration is invalid or could not be loaded/saved.
    Config(ConfigError),
    /// No device is registered under this identifier.
    UnknownDevice(DeviceId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "event store: {e}"),
            Self::Solar(e) => write!(f, "solar: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::UnknownDevice(id) => write!(f, "unknown device {id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Every slot is occupied; nothing was changed.
    TableFull,
    /// No live event carries the given identity.
    NotFound,
    /// The event names a device outside the registry range.
    InvalidDevice,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "event table full"),
            Self::NotFound => write!(f, "no such event"),
            Self::InvalidDevice => write!(f, "device id out of range"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Solar errors
// ---------------------------------------------------------------------------

/// Reasons a day has no solar times. Any of these makes the whole day
/// unavailable; there are no partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarError {
    /// The sun stays above the horizon all day.
    PolarDay,
    /// The sun stays below the horizon all day.
    PolarNight,
    /// Latitude or longitude is out of range or not finite.
    InvalidLocation,
}

impl fmt::Display for SolarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolarDay => write!(f, "sun never sets"),
            Self::PolarNight => write!(f, "sun never rises"),
            Self::InvalidLocation => write!(f, "invalid location"),
        }
    }
}

impl From<SolarError> for Error {
    fn from(e: SolarError) -> Self {
        Self::Solar(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    /// A GPIO write returned an error.
    Gpio(ErrorKind),
}

impl HwError {
    /// Adapter for `map_err` on any `embedded-hal` digital error.
    pub fn from_pin<E: embedded_hal::digital::Error>(e: E) -> Self {
        Self::Gpio(e.kind())
    }
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(kind) => write!(f, "GPIO write failed ({kind:?})"),
        }
    }
}

impl From<HwError> for Error {
    fn from(e: HwError) -> Self {
        Self::Hardware(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
