//! GPIO / peripheral pin assignments for the compressor controller board
//! (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Compressor relay
// ---------------------------------------------------------------------------

/// Relay module input.  Active LOW: driving the pin LOW energises the coil.
pub const RELAY_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED, active HIGH.  Lit while the compressor runs.
pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Tank-full float switch
// ---------------------------------------------------------------------------

/// Float switch to GND with the internal pull-up enabled.
/// LOW = tank full (switch closed), HIGH = not full.
pub const TANK_FULL_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Temperature (ADC1)
// ---------------------------------------------------------------------------

/// NTC thermistor on the compressor head, 10 kΩ @ 25 °C in a divider.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const TEMP_ADC_GPIO: i32 = 4;
/// ADC1 channel number matching [`TEMP_ADC_GPIO`].
pub const TEMP_ADC_CHANNEL: u32 = 3;
