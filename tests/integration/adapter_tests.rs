//! Service wired to the real host-side adapters (simulated WiFi link,
//! recording HTTP remote behind the push task, in-memory NVS).

use std::cell::RefCell;
use std::rc::Rc;

use hazardwatch::adapters::nvs::{NvsAdapter, load_or_default};
use hazardwatch::adapters::push_task;
use hazardwatch::adapters::remote::HttpRemote;
use hazardwatch::adapters::wifi::WifiAdapter;
use hazardwatch::app::ports::{ClockPort, ConfigPort, RemotePort};
use hazardwatch::app::service::AppService;
use hazardwatch::config::SystemConfig;
use hazardwatch::fsm::StateId;
use hazardwatch::sync::outbox::Outbox;

use crate::mock_hw::{Journal, MockClock, MockHw, NoDelay, TICK_MS, VecSink};

fn provisioned() -> SystemConfig {
    let mut cfg = SystemConfig::default();
    cfg.remote
        .database_url
        .push_str("https://hazard.example.com")
        .unwrap();
    cfg.remote.auth_token.push_str("secret").unwrap();
    cfg.wifi.ssid.push_str("PlantFloor").unwrap();
    cfg.wifi.password.push_str("password1").unwrap();
    cfg
}

#[test]
fn pushes_flow_through_wifi_and_http_once_link_is_up() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.save(&provisioned()).unwrap();
    let config = load_or_default(&nvs);

    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let clock = MockClock::new(true);
    let mut hw = MockHw::new(journal);
    let mut sink = VecSink::default();

    let mut wifi = WifiAdapter::new();
    wifi.set_credentials(&config.wifi.ssid, &config.wifi.password).unwrap();
    let mut remote = HttpRemote::new(wifi, config.remote.clone());
    let outbox = Outbox::new();

    let mut app = AppService::new(config);
    app.calibrate(&mut hw, &mut NoDelay, &mut sink);
    app.start(&clock, &mut sink);

    // Push task passes interleaved with ticks.
    let mut step = |app: &mut AppService, remote: &mut HttpRemote<WifiAdapter>, until: u64| {
        while clock.now() <= until {
            push_task::service(&outbox, remote, clock.uptime_ms());
            app.tick(&mut hw, &outbox, &clock, &mut sink);
            push_task::service(&outbox, remote, clock.uptime_ms());
            clock.advance(TICK_MS);
        }
    };

    // Associating: nothing is sent, alarm logic runs regardless.
    step(&mut app, &mut remote, 990);
    assert!(!remote.is_connected());
    assert!(remote.sim_sent().is_empty());

    remote.link_mut().sim_set_link_up(true);
    step(&mut app, &mut remote, 1000);
    assert!(remote.is_connected());
    assert_eq!(remote.sim_sent().len(), 1);
    assert_eq!(
        remote.sim_sent()[0].url,
        "https://hazard.example.com/sensor.json?auth=secret"
    );

    // Baseline was 300 and the mock keeps reading 300: periodic pushes only.
    step(&mut app, &mut remote, 5000);
    assert_eq!(app.state(), StateId::Safe);
    assert_eq!(remote.sim_sent().len(), 2);
    assert!(
        remote
            .sim_sent()
            .iter()
            .all(|r| r.url.starts_with("https://hazard.example.com/sensor.json"))
    );
}

#[test]
fn stored_thresholds_drive_the_service() {
    let nvs = NvsAdapter::new().unwrap();
    let cfg = SystemConfig {
        fire_threshold_c: 50.0,
        ..Default::default()
    };
    nvs.save(&cfg).unwrap();

    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let clock = MockClock::new(false);
    let mut hw = MockHw::new(journal);
    let mut sink = VecSink::default();
    let outbox = Outbox::new();

    let mut app = AppService::new(load_or_default(&nvs));
    app.calibrate(&mut hw, &mut NoDelay, &mut sink);
    app.start(&clock, &mut sink);

    hw.temperature_c = 40.0;
    app.tick(&mut hw, &outbox, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Safe);

    hw.temperature_c = 50.0;
    clock.set(2000);
    app.tick(&mut hw, &outbox, &clock, &mut sink);
    assert_eq!(app.state(), StateId::Alert);
    assert!(hw.alarm);
}
