//! Mock adapters for integration tests.
//!
//! The sensor/alarm mock and the remote mock share a [`Journal`] so tests
//! can assert on the relative order of alarm writes and network pushes.
//! [`Rig`] drives the push side itself, standing in for the I/O thread:
//! each request occupies it for `MockRemote::latency_ms` of simulated
//! time while the control loop keeps ticking.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use hazardwatch::app::events::AppEvent;
use hazardwatch::app::ports::{AlarmPort, ClockPort, EventSink, RemotePort, SensorPort, WallClock};
use hazardwatch::app::service::AppService;
use hazardwatch::config::SystemConfig;
use hazardwatch::error::{CommsError, SensorError};
use hazardwatch::sync::outbox::{Outbox, PushRequest, deliver};

/// 2024-01-15 14:23:01 UTC.
pub const WALL_BASE: i64 = 1_705_328_581;

/// Main-loop period used by [`Rig::run_until`].
pub const TICK_MS: u64 = 10;

// ── Call journal ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Alarm(bool),
    Put(String),
}

pub type Journal = Rc<RefCell<Vec<Call>>>;

// ── MockHw ────────────────────────────────────────────────────

pub struct MockHw {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub gas: u16,
    pub climate_fault: Option<SensorError>,
    pub alarm: bool,
    journal: Journal,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new(journal: Journal) -> Self {
        Self {
            temperature_c: 24.0,
            humidity_pct: 45.0,
            gas: 300,
            climate_fault: None,
            alarm: false,
            journal,
        }
    }

    /// Number of level changes driven to the buzzer.
    pub fn alarm_edges(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Alarm(_)))
            .count()
    }
}

impl SensorPort for MockHw {
    fn read_climate(&mut self) -> Result<(f32, f32), SensorError> {
        match self.climate_fault {
            Some(e) => Err(e),
            None => Ok((self.temperature_c, self.humidity_pct)),
        }
    }

    fn read_gas_raw(&mut self) -> u16 {
        self.gas
    }
}

impl AlarmPort for MockHw {
    fn set_alarm(&mut self, on: bool) {
        if on != self.alarm {
            self.journal.borrow_mut().push(Call::Alarm(on));
        }
        self.alarm = on;
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockClock {
    now_ms: Rc<Cell<u64>>,
    synced: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new(synced: bool) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
            synced: Rc::new(Cell::new(synced)),
        }
    }

    pub fn now(&self) -> u64 {
        self.now_ms.get()
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl ClockPort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn wall_clock(&self) -> WallClock {
        if self.synced.get() {
            WallClock {
                unix_secs: WALL_BASE + (self.now_ms.get() / 1000) as i64,
                synced: true,
            }
        } else {
            WallClock::default()
        }
    }
}

// ── MockRemote ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Put {
    pub path: String,
    pub doc: serde_json::Value,
}

pub struct MockRemote {
    pub connected: bool,
    pub fail_with: Option<CommsError>,
    /// Simulated request duration on the push side.
    pub latency_ms: u64,
    pub puts: Vec<Put>,
    journal: Journal,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn new(journal: Journal) -> Self {
        Self {
            connected: true,
            fail_with: None,
            latency_ms: 0,
            puts: Vec::new(),
            journal,
        }
    }

    pub fn alert_puts(&self) -> Vec<&Put> {
        self.puts
            .iter()
            .filter(|p| p.path.starts_with("/alerts/"))
            .collect()
    }

    pub fn sensor_puts(&self) -> Vec<&Put> {
        self.puts.iter().filter(|p| p.path == "/sensor").collect()
    }
}

impl RemotePort for MockRemote {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn put(&mut self, path: &str, body: &[u8]) -> Result<(), CommsError> {
        self.journal.borrow_mut().push(Call::Put(path.to_string()));
        if !self.connected {
            return Err(CommsError::Offline);
        }
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        let doc = serde_json::from_slice(body).map_err(|_| CommsError::Encode)?;
        self.puts.push(Put {
            path: path.to_string(),
            doc,
        });
        Ok(())
    }
}

// ── Sink / delay ──────────────────────────────────────────────

#[derive(Default)]
pub struct VecSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl VecSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for VecSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Rig ───────────────────────────────────────────────────────

/// A calibrated, started service wired to mocks.
pub struct Rig {
    pub app: AppService,
    pub hw: MockHw,
    pub remote: MockRemote,
    pub clock: MockClock,
    pub sink: VecSink,
    pub journal: Journal,
    pub outbox: Arc<Outbox>,
    /// When false the test runs its own push thread against `outbox`.
    pub inline_push: bool,
    /// `(uptime_ms, level)` for every buzzer level change.
    pub alarm_edges: Vec<(u64, bool)>,
    in_flight: Option<(u64, PushRequest)>,
}

#[allow(dead_code)]
impl Rig {
    /// Boot with default config, a 300-count gas baseline and a synced clock.
    pub fn boot() -> Self {
        Self::boot_with(SystemConfig::default(), true)
    }

    pub fn boot_with(config: SystemConfig, synced: bool) -> Self {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));
        let clock = MockClock::new(synced);
        let mut hw = MockHw::new(journal.clone());
        let remote = MockRemote::new(journal.clone());
        let mut sink = VecSink::default();
        let mut app = AppService::new(config);
        app.calibrate(&mut hw, &mut NoDelay, &mut sink);
        app.start(&clock, &mut sink);
        Self {
            app,
            hw,
            remote,
            clock,
            sink,
            journal,
            outbox: Arc::new(Outbox::new()),
            inline_push: true,
            alarm_edges: Vec::new(),
            in_flight: None,
        }
    }

    pub fn tick(&mut self) {
        self.service_push();
        let before = self.hw.alarm;
        self.app
            .tick(&mut self.hw, &self.outbox, &self.clock, &mut self.sink);
        if self.hw.alarm != before {
            self.alarm_edges.push((self.clock.now(), self.hw.alarm));
        }
        self.service_push();
    }

    /// Simulated push thread: one request at a time, each finishing
    /// `latency_ms` after it was picked up.
    fn service_push(&mut self) {
        if !self.inline_push {
            return;
        }
        let now = self.clock.now();
        self.outbox.set_link_up(self.remote.connected);
        loop {
            if let Some((done_at, _)) = &self.in_flight {
                if now < *done_at {
                    return;
                }
                if let Some((_, request)) = self.in_flight.take() {
                    deliver(&self.outbox, &mut self.remote, request);
                }
            }
            match self.outbox.try_next() {
                Some(request) => self.in_flight = Some((now + self.remote.latency_ms, request)),
                None => return,
            }
        }
    }

    /// Durations of consecutive alarm phases as `(level, ms)`.
    pub fn alarm_phases(&self) -> Vec<(bool, u64)> {
        self.alarm_edges
            .windows(2)
            .map(|w| (w[0].1, w[1].0 - w[0].0))
            .collect()
    }

    /// Tick every [`TICK_MS`] from the current time up to and including
    /// `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) {
        while self.clock.now() <= end_ms {
            self.tick();
            self.clock.advance(TICK_MS);
        }
    }

    /// Tick exactly once at `ms`.
    pub fn tick_at(&mut self, ms: u64) {
        self.clock.set(ms);
        self.tick();
    }
}
