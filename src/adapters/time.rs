//! ESP32 time adapter.
//!
//! Implements [`ClockPort`]:
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`,
//!   wall clock from `gettimeofday()` once SNTP has set it.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side runs.
//!
//! The wall clock counts as synced only once it reads later than
//! 2020-01-01; before SNTP completes the RTC starts at the epoch.
//!
//! Also provides the blocking [`BootDelay`] used by calibration.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ClockPort, WallClock};

/// 2020-01-01T00:00:00Z.
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(target_os = "espidf")]
    _sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(target_os = "espidf")]
            _sntp: None,
        }
    }

    /// Start background SNTP.  Returns immediately; the wall clock
    /// becomes synced whenever the first response arrives.
    #[cfg(target_os = "espidf")]
    pub fn start_sntp(&mut self) {
        match esp_idf_svc::sntp::EspSntp::new_default() {
            Ok(sntp) => {
                log::info!("SNTP: started");
                self._sntp = Some(sntp);
            }
            Err(e) => log::warn!("SNTP: start failed ({e}); labels will use uptime"),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start_sntp(&mut self) {
        log::info!("SNTP(sim): host clock assumed synced");
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn unix_secs(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some(i64::from(tv.tv_sec))
    }

    #[cfg(not(target_os = "espidf"))]
    fn unix_secs(&self) -> Option<i64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    fn wall_clock(&self) -> WallClock {
        match self.unix_secs() {
            Some(secs) if secs >= EPOCH_2020 => WallClock {
                unix_secs: secs,
                synced: true,
            },
            _ => WallClock::default(),
        }
    }
}

// ── Blocking delay (calibration only) ─────────────────────────

/// Blocking delay for the boot-time warm-up and calibration.
///
/// On target this yields to FreeRTOS, so the idle task (and the task
/// watchdog) keep running during the multi-second warm-up.
#[derive(Debug, Default, Clone, Copy)]
pub struct BootDelay;

impl DelayNs for BootDelay {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_us(ns.div_ceil(1000));
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
