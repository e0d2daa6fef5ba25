//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the gas sensor, the DHT22 and the buzzer, exposing them through
//! [`SensorPort`] and [`AlarmPort`].  This is the only module in the
//! system that touches sensor and alarm hardware.  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{AlarmPort, SensorPort};
use crate::drivers::buzzer::Buzzer;
use crate::error::SensorError;
use crate::pins;
use crate::sensors::dht::Dht22;
use crate::sensors::gas::GasSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    gas: GasSensor,
    dht: Dht22,
    buzzer: Buzzer,
}

impl HardwareAdapter {
    pub fn new(gas: GasSensor, dht: Dht22, buzzer: Buzzer) -> Self {
        Self { gas, dht, buzzer }
    }

    /// Build the adapter on the board's default pin map.
    pub fn with_default_pins() -> Self {
        Self::new(
            GasSensor::new(pins::GAS_ADC_CHANNEL),
            Dht22::new(pins::DHT_DATA_GPIO),
            Buzzer::new(pins::BUZZER_GPIO),
        )
    }

    pub fn buzzer(&self) -> &Buzzer {
        &self.buzzer
    }

    pub fn dht_failures(&self) -> u32 {
        self.dht.failures()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_climate(&mut self) -> Result<(f32, f32), SensorError> {
        self.dht
            .read()
            .map(|r| (r.temperature_c, r.humidity_pct))
    }

    fn read_gas_raw(&mut self) -> u16 {
        self.gas.read_raw()
    }
}

// ── AlarmPort implementation ──────────────────────────────────

impl AlarmPort for HardwareAdapter {
    fn set_alarm(&mut self, on: bool) {
        self.buzzer.set(on);
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::sensors::dht::{sim_set_climate, sim_set_climate_fault};

    // Single test: the DHT simulation is process-global.
    #[test]
    fn climate_roundtrips_through_sim_frame_and_faults() {
        let mut hw = HardwareAdapter::with_default_pins();
        sim_set_climate(-12.3, 61.0);
        let (t, h) = hw.read_climate().unwrap();
        assert!((t + 12.3).abs() < 0.05);
        assert!((h - 61.0).abs() < 0.05);

        sim_set_climate_fault(true);
        assert_eq!(hw.read_climate(), Err(SensorError::Timeout));
        sim_set_climate_fault(false);
        assert_eq!(hw.dht_failures(), 1);

        hw.set_alarm(true);
        hw.set_alarm(true);
        assert!(hw.buzzer().is_on());
        assert_eq!(hw.buzzer().writes(), 1);
    }
}
