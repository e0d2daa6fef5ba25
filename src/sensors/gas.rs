//! MQ-2 combustible gas / smoke sensor driver.
//!
//! Raw ADC counts only; there is no ppm conversion.  Hazard detection is
//! relative to the boot-time clean-air baseline, so absolute calibration
//! against a reference gas is unnecessary.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_GAS_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_adc(raw: u16) {
    SIM_GAS_ADC.store(raw, Ordering::Relaxed);
}

/// Full-scale ADC reading (12-bit).
pub const ADC_MAX: u16 = 4095;

pub struct GasSensor {
    channel: u32,
    total_reads: u32,
}

impl GasSensor {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            total_reads: 0,
        }
    }

    pub fn read_raw(&mut self) -> u16 {
        self.total_reads = self.total_reads.saturating_add(1);
        self.read_adc().min(ADC_MAX)
    }

    pub fn total_reads(&self) -> u32 {
        self.total_reads
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        let _ = self.channel;
        SIM_GAS_ADC.load(Ordering::Relaxed)
    }
}
