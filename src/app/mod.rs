//! Application core: domain orchestration with no direct I/O.
//!
//! Ties the event store, day-scoped scheduler, reducer, applier and the
//! device registry into one control loop. All interaction with hardware,
//! time and storage happens through the **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
