//! Sensor subsystem: drivers, boot calibration and the periodic
//! [`SampleAcquirer`].
//!
//! The acquirer is the only writer of the [`EnvironmentSnapshot`].  A
//! failed climate read keeps the previous temperature and humidity; the
//! gas level is re-read on every sample regardless.

pub mod calibration;
pub mod dht;
pub mod gas;

use log::warn;

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::fsm::context::EnvironmentSnapshot;
use crate::timer::{Instant, IntervalTimer};

/// Outcome of a sample attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Not due this tick.
    Skipped,
    /// All values refreshed.
    Fresh,
    /// Gas refreshed; climate kept from the last good read.
    Degraded(SensorError),
}

pub struct SampleAcquirer {
    timer: IntervalTimer,
    snapshot: EnvironmentSnapshot,
    consecutive_failures: u32,
    total_failures: u32,
}

impl SampleAcquirer {
    pub fn new(sample_interval_ms: u32) -> Self {
        Self {
            timer: IntervalTimer::new(sample_interval_ms),
            snapshot: EnvironmentSnapshot::default(),
            consecutive_failures: 0,
            total_failures: 0,
        }
    }

    /// Sample if the interval has elapsed.  Never blocks beyond the
    /// sensor's own protocol timing and never returns an error.
    pub fn poll(&mut self, sensor: &mut impl SensorPort, now: Instant) -> SampleOutcome {
        if !self.timer.fire_if_due(now) {
            return SampleOutcome::Skipped;
        }

        let climate = sensor.read_climate().and_then(|(t, h)| {
            if t.is_finite() && h.is_finite() {
                Ok((t, h))
            } else {
                Err(SensorError::InvalidReading)
            }
        });
        let gas_raw = sensor.read_gas_raw();

        let mut next = self.snapshot;
        next.gas_raw = gas_raw;
        next.sampled_at = now;

        let outcome = match climate {
            Ok((t, h)) => {
                next.temperature_c = t;
                next.humidity_pct = h;
                self.consecutive_failures = 0;
                SampleOutcome::Fresh
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.total_failures = self.total_failures.saturating_add(1);
                warn!(
                    "climate read failed ({}), keeping {:.1} C / {:.1} % [{} in a row]",
                    e, next.temperature_c, next.humidity_pct, self.consecutive_failures
                );
                SampleOutcome::Degraded(e)
            }
        };

        self.snapshot = next;
        outcome
    }

    pub fn snapshot(&self) -> &EnvironmentSnapshot {
        &self.snapshot
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_failures(&self) -> u32 {
        self.total_failures
    }
}
