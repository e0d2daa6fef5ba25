//! Boot-time clean-air gas baseline.
//!
//! Runs once, synchronously, before the tick loop.  This is the only code
//! path allowed to block: it waits out the heater warm-up, then averages
//! `calibration_samples` gas readings spaced `calibration_spacing_ms`
//! apart.  There is no failure path; a disconnected sensor reads 0 and
//! yields a zero baseline.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::fsm::context::Baseline;

/// Result of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResult {
    pub baseline: Baseline,
    pub samples: u16,
}

/// Block through the warm-up period, logging progress once per second.
pub fn warm_up(delay: &mut impl DelayNs, warmup_ms: u32) {
    if warmup_ms == 0 {
        return;
    }
    info!("Gas sensor warm-up: {} s", warmup_ms.div_ceil(1000));
    let mut remaining = warmup_ms;
    while remaining > 0 {
        let step = remaining.min(1000);
        delay.delay_ms(step);
        remaining -= step;
        if remaining > 0 && remaining % 1000 == 0 {
            info!("Warm-up: {} s remaining", remaining / 1000);
        }
    }
}

/// Average `config.calibration_samples` gas readings into a baseline.
pub fn calibrate(
    sensor: &mut impl SensorPort,
    delay: &mut impl DelayNs,
    config: &SystemConfig,
) -> CalibrationResult {
    let samples = config.calibration_samples.max(1);
    info!("Calibrating gas baseline ({} samples)...", samples);

    let mut sum: u32 = 0;
    for i in 0..samples {
        sum += u32::from(sensor.read_gas_raw());
        if i + 1 < samples {
            delay.delay_ms(config.calibration_spacing_ms);
        }
    }

    let gas = (sum / u32::from(samples)) as u16;
    info!("Gas baseline: {}", gas);
    CalibrationResult {
        baseline: Baseline { gas },
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;

    struct CountingDelay {
        total_ms: u64,
        calls: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
            self.calls += 1;
        }
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
            self.calls += 1;
        }
    }

    struct Sequence {
        values: Vec<u16>,
        idx: usize,
    }

    impl SensorPort for Sequence {
        fn read_climate(&mut self) -> Result<(f32, f32), SensorError> {
            Ok((20.0, 40.0))
        }
        fn read_gas_raw(&mut self) -> u16 {
            let v = self.values[self.idx % self.values.len()];
            self.idx += 1;
            v
        }
    }

    fn delay() -> CountingDelay {
        CountingDelay {
            total_ms: 0,
            calls: 0,
        }
    }

    #[test]
    fn baseline_is_integer_mean() {
        let mut s = Sequence {
            values: vec![300, 301, 302, 303],
            idx: 0,
        };
        let cfg = SystemConfig {
            calibration_samples: 4,
            ..Default::default()
        };
        let r = calibrate(&mut s, &mut delay(), &cfg);
        assert_eq!(r.baseline.gas, 301);
        assert_eq!(r.samples, 4);
        assert_eq!(s.idx, 4);
    }

    #[test]
    fn samples_are_spaced() {
        let mut s = Sequence {
            values: vec![100],
            idx: 0,
        };
        let mut d = delay();
        calibrate(&mut s, &mut d, &SystemConfig::default());
        // 20 samples → 19 gaps of 100 ms.
        assert_eq!(d.total_ms, 1900);
    }

    #[test]
    fn absent_sensor_gives_zero_baseline() {
        let mut s = Sequence {
            values: vec![0],
            idx: 0,
        };
        let r = calibrate(&mut s, &mut delay(), &SystemConfig::default());
        assert_eq!(r.baseline, Baseline { gas: 0 });
    }

    #[test]
    fn warm_up_waits_full_period_in_one_second_steps() {
        let mut d = delay();
        warm_up(&mut d, 2500);
        assert_eq!(d.total_ms, 2500);
        assert_eq!(d.calls, 3);

        let mut d = delay();
        warm_up(&mut d, 0);
        assert_eq!(d.calls, 0);
    }
}
