//! GPIO / peripheral pin assignments for the HazardWatch board (ESP32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 temperature / humidity sensor, single-wire data line.
/// Open-drain with external 10 kΩ pull-up.
pub const DHT_DATA_GPIO: i32 = 4;

/// MQ-2 gas sensor analog output via resistive divider.
/// ADC1 channel 6 (GPIO 34 on ESP32, input-only).
pub const GAS_ADC_GPIO: i32 = 34;
/// ADC1 channel number for [`GAS_ADC_GPIO`].
pub const GAS_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Active buzzer via NPN low-side switch (HIGH = sounding).
pub const BUZZER_GPIO: i32 = 26;
