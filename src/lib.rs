//! Coop door controller library.
//!
//! Exposes the scheduling core, device drivers and adapters for the
//! firmware binary and for host-side integration testing. ESP-IDF-only
//! code is guarded by `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod devices;
pub mod door;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
pub mod safety;
pub mod schedule;
pub mod solar;
pub mod time;
