//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (devices, clock, event sinks, storage) implement these
//! traits. The [`AppService`](super::service::AppService) consumes them via
//! generics, so the scheduling core never touches hardware directly.

use chrono::NaiveDateTime;

use crate::config::PersistentConfig;
use crate::devices::{DeviceId, DeviceState, MAX_DEVICES};
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Device port (domain → actuators)
// ───────────────────────────────────────────────────────────────

/// Get/set capability over the device registry, used by the schedule
/// applier.
pub trait DevicePort {
    /// Every live device identifier.
    fn device_ids(&self) -> heapless::Vec<DeviceId, MAX_DEVICES>;

    /// Current externally visible state; `None` if no such device.
    fn state(&self, id: DeviceId) -> Option<DeviceState>;

    /// Command a state change. May start a timed transition that the
    /// device completes over later ticks.
    fn set_state(&mut self, id: DeviceId, state: DeviceState) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (RTC + uptime)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Local wall-clock time, or `None` while the RTC is unset.
    fn now(&self) -> Option<NaiveDateTime>;

    /// Free-running millisecond counter. Wraps at `u32::MAX`.
    fn uptime_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Schedule observer (event store → scheduler)
// ───────────────────────────────────────────────────────────────

/// Notified once per successful event-table mutation.
///
/// Lets the [`EventStore`](crate::schedule::EventStore) announce changes
/// without depending on the [`Scheduler`](crate::schedule::Scheduler),
/// which implements this by bumping its etag.
pub trait ScheduleObserver {
    fn on_schedule_changed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the configuration and event table.
///
/// Implementations MUST validate on load and on save. Out-of-range values
/// are rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    fn load(&self) -> core::result::Result<PersistentConfig, ConfigError>;

    fn save(&mut self, config: &PersistentConfig) -> core::result::Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Raw namespaced key-value storage.
///
/// Writes MUST be atomic: no partial blobs after power loss. ESP-IDF NVS
/// guarantees this natively.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> core::result::Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> core::result::Result<(), StorageError>;

    /// Delete a key. `Ok(())` even if it did not exist.
    fn delete(&mut self, namespace: &str, key: &str) -> core::result::Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet (first boot).
    NotFound,
    /// Stored blob has the wrong magic or format version.
    Incompatible,
    /// Length, digest, or payload decode check failed.
    Corrupted,
    /// A field failed range validation; names the field.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    /// Destination buffer smaller than the stored value.
    BufferTooSmall,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Incompatible => write!(f, "config format incompatible"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::BufferTooSmall => Self::Corrupted,
            StorageError::IoError => Self::IoError,
        }
    }
}
