//! HazardWatch firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   NvsAdapter   Esp32Time     │
//! │  (Sensor+Alarm)      (EventSink)    (Config)     (Clock+SNTP)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic, APP_CPU)          │    │
//! │  │  Sampler · Hazard · FSM · Alarm · Sync                 │    │
//! │  └───────────────────────────┬────────────────────────────┘    │
//! │                              │ OUTBOX (embassy-sync)           │
//! │  ┌───────────────────────────▼────────────────────────────┐    │
//! │  │  push-io thread (PRO_CPU): HttpRemote<WifiAdapter>     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::wifi::EspWifi;

use hazardwatch::adapters::hardware::HardwareAdapter;
use hazardwatch::adapters::log_sink::LogEventSink;
use hazardwatch::adapters::nvs;
use hazardwatch::adapters::push_task;
use hazardwatch::adapters::remote::HttpRemote;
use hazardwatch::adapters::time::{BootDelay, Esp32TimeAdapter};
use hazardwatch::adapters::wifi::WifiAdapter;
use hazardwatch::app::service::AppService;
use hazardwatch::config::SystemConfig;
use hazardwatch::drivers::hw_init;
use hazardwatch::drivers::watchdog::Watchdog;
use hazardwatch::sync::outbox::Outbox;

/// Main-loop yield between ticks.
const LOOP_YIELD_MS: u32 = 10;

/// Shared by the control loop and the push I/O thread.
static OUTBOX: Outbox = Outbox::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HazardWatch v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    // Without the ADC and buzzer there is nothing useful to do.
    hw_init::init_peripherals()
        .inspect_err(|e| error!("HAL init failed: {}, aborting", e))?;

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let config = nvs::open_config().unwrap_or_else(|e| {
        warn!("NVS unavailable ({}), running with defaults", e);
        SystemConfig::default()
    });

    // ── 4. Connectivity + push thread, SNTP ───────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, None)?;
    let mut wifi = WifiAdapter::new(esp_wifi);
    if config.wifi.ssid.is_empty() {
        warn!("WiFi: no credentials provisioned, running offline");
    } else if let Err(e) = wifi.set_credentials(&config.wifi.ssid, &config.wifi.password) {
        warn!("WiFi: {}", e);
    }
    let remote = HttpRemote::new(wifi, config.remote.clone());
    let _push_io = push_task::spawn(&OUTBOX, remote)?;

    let mut clock = Esp32TimeAdapter::new();
    clock.start_sntp();

    // ── 5. Domain ─────────────────────────────────────────────
    let mut hw = HardwareAdapter::with_default_pins();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config.clone());

    // Warm-up and calibration block; the TWDT is armed afterwards.
    app.calibrate(&mut hw, &mut BootDelay, &mut sink);

    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);
    app.start(&clock, &mut sink);

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        app.tick(&mut hw, &OUTBOX, &clock, &mut sink);
        watchdog.feed();
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }
}
