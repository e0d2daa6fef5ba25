//! Remote document shapes.
//!
//! The dashboard reads these verbatim: camelCase keys, floats rounded to
//! one decimal place.  Serialised with `serde_json` into a heap buffer
//! that lives only for the duration of the push.

use serde::Serialize;

use crate::error::CommsError;
use crate::fsm::context::EnvironmentSnapshot;
use crate::hazard::{AlertReason, HazardVerdict};

pub const SENSOR_PATH: &str = "/sensor";
pub const ALERTS_PATH: &str = "/alerts";

/// Round to one decimal place for display.
pub fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Live state document at `/sensor`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDocument<'a> {
    pub fire_status: bool,
    pub gas_level: u16,
    pub temperature: f32,
    pub humidity: f32,
    pub alert_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_time: Option<&'a str>,
}

impl<'a> SensorDocument<'a> {
    fn base(snapshot: &EnvironmentSnapshot, verdict: HazardVerdict, alert_active: bool) -> Self {
        Self {
            fire_status: verdict.fire,
            gas_level: snapshot.gas_raw,
            temperature: round1(snapshot.temperature_c),
            humidity: round1(snapshot.humidity_pct),
            alert_active,
            last_updated: None,
            alert_time: None,
        }
    }

    /// Periodic push and safe-reset update.
    pub fn live(
        snapshot: &EnvironmentSnapshot,
        verdict: HazardVerdict,
        alert_active: bool,
        label: &'a str,
    ) -> Self {
        Self {
            last_updated: Some(label),
            ..Self::base(snapshot, verdict, alert_active)
        }
    }

    /// Update accompanying a new alert.
    pub fn alert(snapshot: &EnvironmentSnapshot, verdict: HazardVerdict, label: &'a str) -> Self {
        Self {
            alert_time: Some(label),
            ..Self::base(snapshot, verdict, true)
        }
    }
}

/// Per-episode record at `/alerts/{key}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDocument<'a> {
    pub fire_status: bool,
    pub gas_level: u16,
    pub temperature: f32,
    pub alert_time: &'a str,
    pub reason: AlertReason,
}

impl<'a> AlertDocument<'a> {
    pub fn new(
        snapshot: &EnvironmentSnapshot,
        verdict: HazardVerdict,
        reason: AlertReason,
        label: &'a str,
    ) -> Self {
        Self {
            fire_status: verdict.fire,
            gas_level: snapshot.gas_raw,
            temperature: round1(snapshot.temperature_c),
            alert_time: label,
            reason,
        }
    }
}

pub fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, CommsError> {
    serde_json::to_vec(doc).map_err(|_| CommsError::Encode)
}
