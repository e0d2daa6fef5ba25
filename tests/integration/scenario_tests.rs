//! End-to-end scenarios: sensor stimulus in, alarm and pushes out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use hazardwatch::app::events::{AppEvent, NoticeKind};
use hazardwatch::app::ports::RemotePort;
use hazardwatch::error::{CommsError, SensorError};
use hazardwatch::fsm::StateId;
use hazardwatch::hazard::AlertReason;
use hazardwatch::sync::outbox::{REQUEST_DEPTH, deliver};

use crate::mock_hw::{Call, Rig, TICK_MS};

fn state_changes(rig: &Rig, from: StateId, to: StateId) -> usize {
    rig.sink
        .count(|e| *e == AppEvent::StateChanged { from, to })
}

// ── Temperature episode ───────────────────────────────────────

#[test]
fn temperature_rise_raises_one_temp_high_alert() {
    let mut rig = Rig::boot();
    rig.hw.temperature_c = 28.0;
    rig.hw.gas = 310;
    rig.run_until(3990);
    assert_eq!(rig.app.state(), StateId::Safe);

    rig.hw.temperature_c = 35.0;
    rig.run_until(4000);
    assert_eq!(rig.app.state(), StateId::Alert);
    assert!(rig.hw.alarm, "alarm must sound on the detecting tick");

    // ON 300 → OFF 200 → ON
    rig.run_until(4600);
    assert_eq!(rig.hw.alarm_edges(), 3);

    // Ten hot samples in total.
    rig.run_until(23_990);
    rig.hw.temperature_c = 28.0;
    rig.run_until(40_000);

    assert_eq!(rig.app.state(), StateId::Safe);
    assert_eq!(rig.app.episodes(), 1);
    assert!(!rig.hw.alarm);

    let alerts = rig.remote.alert_puts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].path, "/alerts/2024-01-15_14-23-05");
    assert_eq!(alerts[0].doc["reason"], "TEMP_HIGH");
    assert_eq!(alerts[0].doc["fireStatus"], true);
    assert_eq!(alerts[0].doc["temperature"], 35.0);
    assert_eq!(alerts[0].doc["gasLevel"], 310);
    assert_eq!(alerts[0].doc["alertTime"], "2024-01-15 14:23:05");

    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::AlertPublished { reason: AlertReason::TempHigh, .. })),
        1
    );
    assert_eq!(state_changes(&rig, StateId::Safe, StateId::Alert), 1);
    assert_eq!(state_changes(&rig, StateId::Alert, StateId::Safe), 1);
}

// ── Gas episode and dwell ─────────────────────────────────────

#[test]
fn gas_spike_resets_exactly_five_seconds_after_drop() {
    let mut rig = Rig::boot();
    rig.hw.gas = 310;
    rig.run_until(1990);

    rig.hw.gas = 450;
    rig.run_until(7990); // samples at 2000, 4000, 6000
    assert_eq!(rig.app.state(), StateId::Alert);

    rig.hw.gas = 305;
    rig.run_until(12_990);
    assert_eq!(rig.app.state(), StateId::Alert);
    rig.run_until(13_000);
    assert_eq!(rig.app.state(), StateId::Safe);

    let alerts = rig.remote.alert_puts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].doc["reason"], "GAS_HIGH");
    assert_eq!(alerts[0].doc["fireStatus"], false);
    assert_eq!(alerts[0].doc["gasLevel"], 450);

    // The safe reset is pushed on the transition tick.
    let sensor = rig.remote.sensor_puts();
    let last = sensor.last().expect("safe reset push");
    assert_eq!(last.doc["alertActive"], false);
    assert_eq!(last.doc["gasLevel"], 305);
    assert_eq!(last.doc["lastUpdated"], "2024-01-15 14:23:14");
}

#[test]
fn alert_entry_pushes_sensor_with_alert_time() {
    let mut rig = Rig::boot();
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(2000);

    let sensor = rig.remote.sensor_puts();
    let doc = &sensor.last().expect("sensor push").doc;
    assert_eq!(doc["alertActive"], true);
    assert_eq!(doc["alertTime"], "2024-01-15 14:23:03");
    assert!(doc.get("lastUpdated").is_none());
}

// ── Link independence ─────────────────────────────────────────

#[test]
fn disconnection_does_not_change_state_or_alarm() {
    let mut online = Rig::boot();
    let mut offline = Rig::boot();
    offline.remote.connected = false;

    let mut t = 0;
    while t <= 30_000 {
        let gas = if (2000..10_000).contains(&t) { 450 } else { 300 };
        for rig in [&mut online, &mut offline] {
            rig.hw.gas = gas;
            rig.tick_at(t);
        }
        assert_eq!(online.app.state(), offline.app.state(), "state diverged at {t}");
        assert_eq!(online.hw.alarm, offline.hw.alarm, "alarm diverged at {t}");
        t += 10;
    }

    assert_eq!(online.app.episodes(), 1);
    assert_eq!(offline.app.episodes(), 1);
    assert_eq!(online.remote.alert_puts().len(), 1);
    assert!(offline.remote.puts.is_empty());
    assert_eq!(
        offline.sink.count(|e| *e == AppEvent::NoticeDropped(NoticeKind::Alert)),
        1
    );
    assert_eq!(
        offline
            .sink
            .count(|e| *e == AppEvent::NoticeDropped(NoticeKind::SafeReset)),
        1
    );
}

#[test]
fn reconnect_pushes_live_document_immediately() {
    let mut rig = Rig::boot();
    rig.remote.connected = false;
    rig.run_until(9990);
    assert!(rig.remote.puts.is_empty());

    rig.remote.connected = true;
    rig.run_until(10_000);
    assert_eq!(rig.remote.sensor_puts().len(), 1);
    assert_eq!(rig.remote.puts[0].doc["lastUpdated"], "2024-01-15 14:23:11");
}

#[test]
fn slow_remote_never_stretches_alarm_phases() {
    let mut rig = Rig::boot();
    let config = rig.app.config().clone();
    rig.remote.latency_ms = u64::from(config.remote.timeout_ms);
    rig.remote.fail_with = Some(CommsError::Timeout);
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(12_000);
    assert_eq!(rig.app.state(), StateId::Alert);

    assert_eq!(rig.alarm_edges.first(), Some(&(2000, true)));
    let on_max = u64::from(config.alarm_on_ms) + TICK_MS;
    let off_max = u64::from(config.alarm_off_ms) + TICK_MS;
    let phases = rig.alarm_phases();
    assert_eq!(phases.len(), 40);
    for (i, &(on, ms)) in phases.iter().enumerate() {
        let max = if on { on_max } else { off_max };
        assert!(ms <= max, "phase {i} (on={on}) lasted {ms} ms");
    }

    // Handed off on the detecting tick, attempted once the push side
    // was free.
    let journal = rig.journal.borrow();
    let sounded = journal.iter().position(|c| *c == Call::Alarm(true));
    let alert_put = journal
        .iter()
        .position(|c| matches!(c, Call::Put(p) if p.starts_with("/alerts/")));
    assert!(sounded.is_some() && alert_put.is_some());
    assert!(sounded < alert_put);
    drop(journal);
    let failed = rig.sink.count(|e| matches!(e, AppEvent::PushFailed { .. }));
    assert!(failed >= 4);
}

#[test]
fn stalled_push_thread_never_blocks_the_tick() {
    struct Stalled {
        gate: mpsc::Receiver<()>,
        entered: Arc<AtomicBool>,
    }

    impl RemotePort for Stalled {
        fn is_connected(&self) -> bool {
            true
        }
        fn put(&mut self, _path: &str, _body: &[u8]) -> Result<(), CommsError> {
            self.entered.store(true, Ordering::SeqCst);
            // Held until the test drops the sender.
            let _ = self.gate.recv_timeout(Duration::from_secs(30));
            Err(CommsError::Timeout)
        }
    }

    let mut rig = Rig::boot();
    rig.inline_push = false;
    rig.outbox.set_link_up(true);

    let (release, gate) = mpsc::channel::<()>();
    let entered = Arc::new(AtomicBool::new(false));
    let stop = Arc::new(AtomicBool::new(false));
    let push_thread = {
        let outbox = Arc::clone(&rig.outbox);
        let stop = Arc::clone(&stop);
        let mut remote = Stalled {
            gate,
            entered: Arc::clone(&entered),
        };
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                match outbox.try_next() {
                    Some(request) => deliver(&outbox, &mut remote, request),
                    None => thread::sleep(Duration::from_millis(1)),
                }
            }
        })
    };

    // The first periodic push wedges the push thread.
    rig.tick_at(0);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !entered.load(Ordering::SeqCst) {
        assert!(std::time::Instant::now() < deadline, "push thread idle");
        thread::yield_now();
    }

    rig.clock.advance(TICK_MS);
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(12_000);

    assert_eq!(rig.app.state(), StateId::Alert);
    let phases = rig.alarm_phases();
    assert_eq!(phases.len(), 40);
    for &(on, ms) in &phases {
        assert_eq!(ms, if on { 300 } else { 200 });
    }

    // Nothing came back and the backlog overflowed rather than waiting.
    let failed = rig.sink.count(|e| matches!(e, AppEvent::PushFailed { .. }));
    let dropped = rig.sink.count(|e| matches!(e, AppEvent::PushDropped { .. }));
    assert_eq!(failed, 0);
    assert!(dropped >= 1);
    assert_eq!(rig.outbox.pending(), REQUEST_DEPTH);

    stop.store(true, Ordering::SeqCst);
    drop(release);
    push_thread.join().unwrap();
}

#[test]
fn failed_pushes_are_reported_and_dropped() {
    let mut rig = Rig::boot();
    rig.remote.fail_with = Some(CommsError::Timeout);
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(2010);

    assert_eq!(rig.app.state(), StateId::Alert);
    assert!(rig.remote.puts.is_empty());
    let published = rig.sink.count(|e| matches!(e, AppEvent::AlertPublished { .. }));
    let failed = rig.sink.count(|e| matches!(e, AppEvent::PushFailed { .. }));
    assert_eq!(published, 0);
    assert!(failed >= 2);
    assert!(rig.app.status().sync.failed >= 2);
}

// ── Sensor failure ────────────────────────────────────────────

#[test]
fn climate_failure_keeps_last_good_values_and_gas_still_alerts() {
    let mut rig = Rig::boot();
    rig.run_until(1990);

    rig.hw.climate_fault = Some(SensorError::Timeout);
    rig.hw.temperature_c = 80.0; // unreadable, must not trigger
    rig.run_until(3990);
    assert_eq!(rig.app.state(), StateId::Safe);

    rig.hw.gas = 450;
    rig.run_until(7990);

    let status = rig.app.status();
    assert_eq!(status.state, StateId::Alert);
    assert_eq!(status.reason, Some(AlertReason::GasHigh));
    assert_eq!(status.snapshot.temperature_c, 24.0);
    assert_eq!(status.snapshot.gas_raw, 450);
    assert_eq!(status.sample_failures, 3);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::SampleFailed(SensorError::Timeout)),
        3
    );
}

// ── Labels and keys ───────────────────────────────────────────

#[test]
fn alert_key_is_sanitized_calendar_label() {
    let mut rig = Rig::boot();
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(2000);

    let alerts = rig.remote.alert_puts();
    assert_eq!(alerts[0].path, "/alerts/2024-01-15_14-23-03");
    assert_eq!(alerts[0].doc["alertTime"], "2024-01-15 14:23:03");
}

#[test]
fn unsynced_keys_are_unique_per_episode() {
    let mut rig = Rig::boot_with(Default::default(), false);
    rig.run_until(1990);
    rig.hw.gas = 450;
    rig.run_until(3990);
    rig.hw.gas = 300;
    rig.run_until(9990);
    assert_eq!(rig.app.state(), StateId::Safe);
    rig.hw.gas = 450;
    rig.run_until(10_000);

    let paths: Vec<&str> = rig
        .remote
        .alert_puts()
        .iter()
        .map(|p| p.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["/alerts/uptime_00-00-02_e1", "/alerts/uptime_00-00-10_e2"]
    );
    for p in &paths {
        assert!(!p.contains(' ') && !p.contains(':'));
    }
    assert_eq!(rig.remote.alert_puts()[0].doc["alertTime"], "uptime_00:00:02");
}
