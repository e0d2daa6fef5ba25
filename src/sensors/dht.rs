//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire protocol, bit-banged on an open-drain GPIO: the host pulls
//! the line low for ≥1 ms, the sensor answers with an 80 µs low / 80 µs
//! high preamble, then 40 data bits where a long (~70 µs) high pulse is a
//! `1` and a short (~26 µs) one is a `0`.
//!
//! Frame layout (5 bytes):
//!
//! ```text
//!  [0..2]  humidity × 10     (big-endian u16)
//!  [2..4]  temperature × 10  (bit 15 = sign, magnitude in bits 0–14)
//!  [4]     checksum          (low byte of sum of bytes 0–3)
//! ```
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs `pins::DHT_DATA_GPIO` with `esp_timer` timing.
//! On host/test: returns values injected through `sim_set_climate` /
//! `sim_set_climate_fault`.

use crate::error::SensorError;

/// Decoded reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode and verify a raw 5-byte frame.
pub fn decode_frame(frame: &[u8; 5]) -> Result<DhtReading, SensorError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let raw_humidity = u16::from_be_bytes([frame[0], frame[1]]);
    let raw_temp = u16::from_be_bytes([frame[2], frame[3]]);

    let humidity_pct = f32::from(raw_humidity) / 10.0;
    let magnitude = f32::from(raw_temp & 0x7FFF) / 10.0;
    let temperature_c = if raw_temp & 0x8000 == 0 {
        magnitude
    } else {
        -magnitude
    };

    // Datasheet range: -40 – 80 °C, 0 – 100 %RH.
    if !(-40.0..=80.0).contains(&temperature_c) || humidity_pct > 100.0 {
        return Err(SensorError::InvalidReading);
    }

    Ok(DhtReading {
        temperature_c,
        humidity_pct,
    })
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicI16, AtomicU16, Ordering};

    // Tenths of a unit, matching the wire format.
    static SIM_TEMP_DECI: AtomicI16 = AtomicI16::new(220);
    static SIM_HUMIDITY_DECI: AtomicU16 = AtomicU16::new(450);
    static SIM_FAULT: AtomicBool = AtomicBool::new(false);

    pub fn set_climate(temperature_c: f32, humidity_pct: f32) {
        SIM_TEMP_DECI.store((temperature_c * 10.0).round() as i16, Ordering::Relaxed);
        SIM_HUMIDITY_DECI.store((humidity_pct * 10.0).round() as u16, Ordering::Relaxed);
    }

    pub fn set_fault(fault: bool) {
        SIM_FAULT.store(fault, Ordering::Relaxed);
    }

    /// Build the frame the sensor would put on the wire.
    pub fn frame() -> Option<[u8; 5]> {
        if SIM_FAULT.load(Ordering::Relaxed) {
            return None;
        }
        let t = SIM_TEMP_DECI.load(Ordering::Relaxed);
        let h = SIM_HUMIDITY_DECI.load(Ordering::Relaxed);
        let t_raw = if t < 0 { t.unsigned_abs() | 0x8000 } else { t as u16 };
        let [h0, h1] = h.to_be_bytes();
        let [t0, t1] = t_raw.to_be_bytes();
        let sum = h0.wrapping_add(h1).wrapping_add(t0).wrapping_add(t1);
        Some([h0, h1, t0, t1, sum])
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    sim::set_climate(temperature_c, humidity_pct);
}

/// While set, every read fails with [`SensorError::Timeout`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate_fault(fault: bool) {
    sim::set_fault(fault);
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Dht22 {
    gpio: i32,
    failures: u32,
}

impl Dht22 {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, failures: 0 }
    }

    /// Total failed reads since boot.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn read(&mut self) -> Result<DhtReading, SensorError> {
        let result = self.read_frame().and_then(|frame| decode_frame(&frame));
        if result.is_err() {
            self.failures = self.failures.saturating_add(1);
        }
        result
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        let _ = self.gpio;
        sim::frame().ok_or(SensorError::Timeout)
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        use crate::drivers::hw_init::{gpio_write, now_us};
        use esp_idf_svc::hal::delay::Ets;

        // Start signal.
        gpio_write(self.gpio, false);
        Ets::delay_ms(2);
        gpio_write(self.gpio, true);
        Ets::delay_us(30);

        self.wait_for_level(false, 200)?;
        self.wait_for_level(true, 200)?;
        self.wait_for_level(false, 200)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            let mut value = 0u8;
            for _ in 0..8 {
                self.wait_for_level(true, 80)?;
                let start = now_us();
                self.wait_for_level(false, 120)?;
                value <<= 1;
                if now_us() - start > 50 {
                    value |= 1;
                }
            }
            *byte = value;
        }
        Ok(frame)
    }

    #[cfg(target_os = "espidf")]
    fn wait_for_level(&self, high: bool, timeout_us: i64) -> Result<(), SensorError> {
        use crate::drivers::hw_init::{gpio_read, now_us};

        let deadline = now_us() + timeout_us;
        while now_us() <= deadline {
            if gpio_read(self.gpio) == high {
                return Ok(());
            }
        }
        Err(SensorError::Timeout)
    }
}
