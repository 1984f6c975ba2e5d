//! GPIO pin assignments for the coop door controller board.
//!
//! Single source of truth: `main` builds every driver from these numbers
//! rather than hard-coding them. Both H-bridges are VNH-style parts with
//! two direction inputs and an active-high enable.

// ---------------------------------------------------------------------------
// Door motor H-bridge
// ---------------------------------------------------------------------------

/// Direction input A. HIGH with INB LOW drives the door open.
pub const DOOR_INA_GPIO: i32 = 1;
/// Direction input B. HIGH with INA LOW drives the door closed.
pub const DOOR_INB_GPIO: i32 = 2;
/// Bridge enable, active HIGH.
pub const DOOR_EN_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Lock solenoid H-bridge
// ---------------------------------------------------------------------------

/// Forward = engage (lock).
pub const LOCK_INA_GPIO: i32 = 4;
/// Reverse = release (unlock).
pub const LOCK_INB_GPIO: i32 = 5;
pub const LOCK_EN_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Auxiliary relays (active HIGH coil drivers)
// ---------------------------------------------------------------------------

pub const RELAY_1_GPIO: i32 = 7;
pub const RELAY_2_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// Wake sources (active-low, external pull-ups)
// ---------------------------------------------------------------------------

/// RTC alarm interrupt output (open drain).
pub const RTC_INT_GPIO: i32 = 9;
/// Door push-button.
pub const DOOR_BUTTON_GPIO: i32 = 10;
/// Configuration-mode slide switch.
pub const CONFIG_SWITCH_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// Door status LED (bi-colour, common cathode)
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 12;
pub const LED_GREEN_GPIO: i32 = 13;
