//! System configuration parameters
//!
//! All tunable parameters for the coop door controller. Values are
//! persisted together with the event table (see
//! [`adapters::config_store`](crate::adapters::config_store)) and can be
//! changed at runtime through [`AppCommand`](crate::app::commands::AppCommand)s.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::schedule::{EventTable, MAX_EVENTS};
use crate::time::DstPolicy;

/// Site coordinates, decimal degrees. North and east are positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::ValidationFailed("latitude must be -90..90"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::ValidationFailed("longitude must be -180..180"));
        }
        Ok(())
    }
}

/// Core system configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Site ---
    /// `None` disables every solar-relative event.
    pub location: Option<Location>,
    /// Standard-time offset from UTC, hours.
    pub utc_offset_hours: i8,
    pub dst: DstPolicy,

    // --- Door ---
    /// Time for the door to travel fully open or closed (ms).
    pub door_travel_ms: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

pub const UTC_OFFSET_RANGE: core::ops::RangeInclusive<i8> = -12..=14;
pub const DOOR_TRAVEL_RANGE_MS: core::ops::RangeInclusive<u32> = 1_000..=60_000;
pub const LOOP_INTERVAL_RANGE_MS: core::ops::RangeInclusive<u32> = 1..=1_000;

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // West-central Arkansas
            location: Some(Location { latitude: 34.4653, longitude: -93.3628 }),
            utc_offset_hours: -6,
            dst: DstPolicy::UnitedStates,

            door_travel_ms: 10_000,

            control_loop_interval_ms: 20, // 50 Hz
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Rejects, never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(loc) = &self.location {
            loc.validate()?;
        }
        if !UTC_OFFSET_RANGE.contains(&self.utc_offset_hours) {
            return Err(ConfigError::ValidationFailed("utc_offset_hours must be -12..14"));
        }
        if !DOOR_TRAVEL_RANGE_MS.contains(&self.door_travel_ms) {
            return Err(ConfigError::ValidationFailed("door_travel_ms must be 1000..60000"));
        }
        if !LOOP_INTERVAL_RANGE_MS.contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed("control_loop_interval_ms must be 1..1000"));
        }
        Ok(())
    }
}

/// Everything that survives a reboot: settings plus the event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentConfig {
    pub system: SystemConfig,
    pub events: EventTable,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self { system: SystemConfig::default(), events: [None; MAX_EVENTS] }
    }
}
