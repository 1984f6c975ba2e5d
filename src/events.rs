//! Interrupt-driven wake sources.
//!
//! ISRs raise bits in a single atomic byte; the main loop drains them
//! with [`WakeFlags::take`] once per iteration.
//!
//! ```text
//! ┌──────────────┐
//! │ RTC alarm    │──┐
//! │ Door button  │──┼──▶ WAKE (AtomicU8) ──take()──▶ AppService::note_wake
//! │ Config sw.   │──┘
//! └──────────────┘
//! ```
//!
//! Raising a bit that is already set is a no-op, so a burst of
//! interrupts between two loop iterations collapses into one wake.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// A hardware source that can end the low-power wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WakeSource {
    RtcAlarm = 1 << 0,
    DoorButton = 1 << 1,
    ConfigSwitch = 1 << 2,
}

impl WakeSource {
    pub const ALL: [Self; 3] = [Self::RtcAlarm, Self::DoorButton, Self::ConfigSwitch];

    const fn bit(self) -> u8 {
        self as u8
    }
}

/// Snapshot of the sources drained by one [`WakeFlags::take`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakeSet(u8);

impl WakeSet {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, source: WakeSource) -> bool {
        self.0 & source.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn with(self, source: WakeSource) -> Self {
        Self(self.0 | source.bit())
    }

    pub fn iter(self) -> impl Iterator<Item = WakeSource> {
        WakeSource::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl fmt::Display for WakeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, source) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{source:?}")?;
        }
        Ok(())
    }
}

/// Lock-free wake bitmask. Safe to raise from ISR context.
pub struct WakeFlags(AtomicU8);

impl Default for WakeFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeFlags {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn raise(&self, source: WakeSource) {
        self.0.fetch_or(source.bit(), Ordering::Release);
    }

    /// Drain every pending source at once.
    pub fn take(&self) -> WakeSet {
        WakeSet(self.0.swap(0, Ordering::Acquire))
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire) != 0
    }
}

/// Global wake flags shared between ISRs and the main loop.
pub static WAKE: WakeFlags = WakeFlags::new();
