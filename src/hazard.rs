//! Hazard evaluator.
//!
//! A pure function of the latest snapshot and the boot-time gas baseline.
//! It runs every tick (not only when a sample lands) so the alert FSM
//! reacts in the same tick a fresh sample crosses a threshold.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::fsm::context::{Baseline, EnvironmentSnapshot};

/// Why an episode was raised.  Serialised verbatim into alert documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertReason {
    TempHigh,
    GasHigh,
}

impl AlertReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TempHigh => "TEMP_HIGH",
            Self::GasHigh => "GAS_HIGH",
        }
    }
}

/// Per-tick evaluation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HazardVerdict {
    pub fire: bool,
    pub gas: bool,
    pub hazard: bool,
}

impl HazardVerdict {
    /// Temperature takes priority when both flags are raised.
    pub fn reason(&self) -> Option<AlertReason> {
        if self.fire {
            Some(AlertReason::TempHigh)
        } else if self.gas {
            Some(AlertReason::GasHigh)
        } else {
            None
        }
    }
}

/// Threshold pair extracted from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub fire_c: f32,
    pub gas_offset: u16,
}

impl Thresholds {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            fire_c: config.fire_threshold_c,
            gas_offset: config.gas_offset,
        }
    }

    /// Absolute gas level that raises the gas flag for `baseline`.
    pub fn gas_limit(&self, baseline: Baseline) -> u16 {
        baseline.gas.saturating_add(self.gas_offset)
    }
}

pub fn evaluate(
    snapshot: &EnvironmentSnapshot,
    baseline: Baseline,
    thresholds: &Thresholds,
) -> HazardVerdict {
    let fire = snapshot.temperature_c >= thresholds.fire_c;
    let gas = snapshot.gas_raw >= thresholds.gas_limit(baseline);
    HazardVerdict {
        fire,
        gas,
        hazard: fire || gas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds::from_config(&SystemConfig::default())
    }

    fn snap(temp: f32, gas: u16) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            temperature_c: temp,
            gas_raw: gas,
            ..Default::default()
        }
    }

    #[test]
    fn fire_threshold_is_inclusive() {
        let base = Baseline { gas: 300 };
        assert!(!evaluate(&snap(32.9, 300), base, &thresholds()).fire);
        let v = evaluate(&snap(33.0, 300), base, &thresholds());
        assert!(v.fire && v.hazard && !v.gas);
    }

    #[test]
    fn gas_threshold_is_relative_to_baseline() {
        let base = Baseline { gas: 300 };
        assert!(!evaluate(&snap(20.0, 379), base, &thresholds()).gas);
        let v = evaluate(&snap(20.0, 380), base, &thresholds());
        assert!(v.gas && v.hazard && !v.fire);
    }

    #[test]
    fn temperature_takes_priority() {
        let v = evaluate(&snap(40.0, 4000), Baseline { gas: 100 }, &thresholds());
        assert_eq!(v.reason(), Some(AlertReason::TempHigh));
        let v = evaluate(&snap(20.0, 4000), Baseline { gas: 100 }, &thresholds());
        assert_eq!(v.reason(), Some(AlertReason::GasHigh));
        let v = evaluate(&snap(20.0, 100), Baseline { gas: 100 }, &thresholds());
        assert_eq!(v.reason(), None);
    }

    #[test]
    fn gas_limit_saturates() {
        let t = thresholds();
        assert_eq!(t.gas_limit(Baseline { gas: u16::MAX - 10 }), u16::MAX);
    }

    #[test]
    fn nan_temperature_never_fires() {
        let v = evaluate(&snap(f32::NAN, 0), Baseline::default(), &thresholds());
        assert!(!v.fire);
    }

    #[test]
    fn reason_serialises_screaming_case() {
        assert_eq!(
            serde_json::to_string(&AlertReason::TempHigh).unwrap(),
            "\"TEMP_HIGH\""
        );
        assert_eq!(AlertReason::GasHigh.as_str(), "GAS_HIGH");
    }
}
