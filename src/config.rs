//! System configuration parameters
//!
//! All tunable parameters for the HazardWatch monitor.  Defaults match the
//! reference unit; values can be overridden from NVS.  Network credentials
//! are never compiled in: they default to empty and are provisioned into
//! the NVS config blob.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Remote document store endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the document store, without trailing slash
    /// (e.g. `https://example-rtdb.firebaseio.com`).
    pub database_url: heapless::String<96>,
    /// Optional access token appended as `?auth=`.
    pub auth_token: heapless::String<128>,
    /// Upper bound on a single PUT (milliseconds).
    pub timeout_ms: u32,
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Hazard thresholds ---
    /// Temperature (Celsius) at or above which the fire flag is raised.
    ///
    /// The reference firmware's header comment says 45 °C while the
    /// operative constant is 33.0 °C.  33.0 is the tested default.
    pub fire_threshold_c: f32,
    /// Raw ADC counts above the clean-air baseline that raise the gas flag.
    pub gas_offset: u16,

    // --- Calibration ---
    /// Number of clean-air gas samples averaged into the baseline.
    pub calibration_samples: u16,
    /// Spacing between calibration samples (milliseconds).
    pub calibration_spacing_ms: u32,
    /// Sensor heater warm-up before calibration (milliseconds).
    pub warmup_ms: u32,

    // --- Timing ---
    /// Sensor read interval (milliseconds).
    pub sample_interval_ms: u32,
    /// Continuous non-hazard time required to leave ALERT (milliseconds).
    pub safe_hold_ms: u32,
    /// Live-document push interval (milliseconds).
    pub push_interval_ms: u32,
    /// Buzzer ON phase (milliseconds).
    pub alarm_on_ms: u32,
    /// Buzzer OFF phase (milliseconds).
    pub alarm_off_ms: u32,
    /// Task watchdog timeout for the main loop (milliseconds).
    pub watchdog_timeout_ms: u32,

    // --- Labels ---
    /// Offset from UTC applied to synced wall-clock labels (seconds).
    pub utc_offset_secs: i32,

    // --- Network ---
    pub remote: RemoteConfig,
    pub wifi: WifiConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Hazard thresholds
            fire_threshold_c: 33.0,
            gas_offset: 80,

            // Calibration
            calibration_samples: 20,
            calibration_spacing_ms: 100,
            warmup_ms: 15_000,

            // Timing
            sample_interval_ms: 2000,
            safe_hold_ms: 5000,
            push_interval_ms: 3000,
            alarm_on_ms: 300,
            alarm_off_ms: 200,
            watchdog_timeout_ms: 10_000,

            utc_offset_secs: 0,

            remote: RemoteConfig {
                database_url: heapless::String::new(),
                auth_token: heapless::String::new(),
                timeout_ms: 1500,
            },
            wifi: WifiConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fire_threshold_c.is_finite() || !(0.0..=120.0).contains(&self.fire_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "fire_threshold_c must be 0.0–120.0",
            ));
        }
        if self.gas_offset == 0 {
            return Err(ConfigError::ValidationFailed("gas_offset must be > 0"));
        }
        if !(1..=200).contains(&self.calibration_samples) {
            return Err(ConfigError::ValidationFailed(
                "calibration_samples must be 1–200",
            ));
        }
        if self.calibration_spacing_ms > 1000 {
            return Err(ConfigError::ValidationFailed(
                "calibration_spacing_ms must be <= 1000",
            ));
        }
        if self.warmup_ms > 120_000 {
            return Err(ConfigError::ValidationFailed("warmup_ms must be <= 120000"));
        }
        if !(100..=60_000).contains(&self.sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be 100–60000",
            ));
        }
        if !(100..=600_000).contains(&self.push_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "push_interval_ms must be 100–600000",
            ));
        }
        if self.safe_hold_ms == 0 || self.safe_hold_ms > 600_000 {
            return Err(ConfigError::ValidationFailed(
                "safe_hold_ms must be 1–600000",
            ));
        }
        if self.alarm_on_ms == 0 || self.alarm_off_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "alarm phases must be non-zero",
            ));
        }
        if self.watchdog_timeout_ms <= self.remote.timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed remote.timeout_ms",
            ));
        }
        if !(100..=10_000).contains(&self.remote.timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "remote.timeout_ms must be 100–10000",
            ));
        }
        if self.utc_offset_secs.abs() > 14 * 3600 {
            return Err(ConfigError::ValidationFailed(
                "utc_offset_secs must be within ±14h",
            ));
        }
        Ok(())
    }

    /// True when a document store endpoint has been provisioned.
    pub fn has_remote(&self) -> bool {
        !self.remote.database_url.is_empty()
    }
}
