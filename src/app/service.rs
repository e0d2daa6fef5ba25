//! Application service, the hexagonal core.
//!
//! [`AppService`] owns every piece of device state: the environment
//! snapshot, the gas baseline, the alert FSM and its context, the alarm
//! pattern, the sync scheduler and the episode counter.  All I/O flows
//! through port traits injected at call sites, so the whole service runs
//! under mock adapters on the host.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ Outbox ──▶ push task
//!                 │        AppService         │
//!   AlarmPort ◀── │ sample · hazard · FSM ·   │ ◀── ClockPort
//!                 │ alarm · sync              │ ──▶ EventSink
//!                 └──────────────────────────┘
//! ```
//!
//! One call to [`AppService::tick`] runs the fixed pipeline
//! sample → evaluate → FSM → alarm → sync and never sleeps.  The sync
//! step only queues encoded documents; network I/O happens on the push
//! task's own thread, so a slow remote cannot hold up the alarm.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::SystemConfig;
use crate::drivers::alarm::AlarmPattern;
use crate::fsm::context::{Baseline, EnvironmentSnapshot, FsmContext, Notice};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::hazard::{self, AlertReason, HazardVerdict, Thresholds};
use crate::sensors::calibration;
use crate::sensors::{SampleAcquirer, SampleOutcome};
use crate::sync::outbox::Outbox;
use crate::sync::{SyncInput, SyncScheduler, SyncStats};
use crate::timer::Instant;

use super::events::AppEvent;
use super::ports::{AlarmPort, ClockPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// Status snapshot
// ───────────────────────────────────────────────────────────────

/// Point-in-time view of the service for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceStatus {
    pub state: StateId,
    pub reason: Option<AlertReason>,
    pub snapshot: EnvironmentSnapshot,
    pub baseline: Baseline,
    pub verdict: HazardVerdict,
    pub alarm_on: bool,
    pub episodes: u32,
    pub sample_failures: u32,
    pub sync: SyncStats,
    pub tick_count: u64,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    thresholds: Thresholds,
    baseline: Baseline,
    sampler: SampleAcquirer,
    alarm: AlarmPattern,
    sync: SyncScheduler,
    config: SystemConfig,
    episodes: u32,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`calibrate`](Self::calibrate)
    /// and then [`start`](Self::start).
    pub fn new(config: SystemConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Safe),
            ctx: FsmContext::new(config.safe_hold_ms),
            thresholds: Thresholds::from_config(&config),
            baseline: Baseline::default(),
            sampler: SampleAcquirer::new(config.sample_interval_ms),
            alarm: AlarmPattern::new(config.alarm_on_ms, config.alarm_off_ms),
            sync: SyncScheduler::new(config.push_interval_ms, config.utc_offset_secs),
            config,
            episodes: 0,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Warm up the gas sensor and establish the clean-air baseline.
    /// Blocks for `warmup_ms` plus the sampling window.
    pub fn calibrate(
        &mut self,
        sensor: &mut impl SensorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Baseline {
        calibration::warm_up(delay, self.config.warmup_ms);
        let result = calibration::calibrate(sensor, delay, &self.config);
        self.baseline = result.baseline;
        sink.emit(&AppEvent::Calibrated {
            baseline: result.baseline.gas,
            samples: result.samples,
        });
        result.baseline
    }

    /// Start the FSM in SAFE.
    pub fn start(&mut self, clock: &impl ClockPort, sink: &mut impl EventSink) {
        let now = Instant::from_uptime_ms(clock.uptime_ms());
        self.fsm.start(&mut self.ctx, now);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!(
            "AppService started in {:?} (gas baseline {}, limit {})",
            self.fsm.current_state(),
            self.baseline.gas,
            self.thresholds.gas_limit(self.baseline)
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one non-blocking cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`AlarmPort`], so one `&mut` covers both while keeping
    /// the port boundary explicit.  `outbox` is only ever touched
    /// through its `try_*` side.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + AlarmPort),
        outbox: &Outbox,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let now = Instant::from_uptime_ms(clock.uptime_ms());

        // 1. Sample (if due)
        if let SampleOutcome::Degraded(e) = self.sampler.poll(hw, now) {
            sink.emit(&AppEvent::SampleFailed(e));
        }

        // 2. Hazard evaluation (every tick)
        let verdict = hazard::evaluate(self.sampler.snapshot(), self.baseline, &self.thresholds);
        self.ctx.now = now;
        self.ctx.verdict = verdict;

        // 3. FSM
        let prev_state = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let new_state = self.fsm.current_state();
        let notice = self.ctx.take_notice();
        if let Some(Notice::Raised(_)) = notice {
            self.episodes = self.episodes.wrapping_add(1);
        }
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        // 4. Alarm output
        let level = self.alarm.update(new_state.is_alert(), now);
        hw.set_alarm(level);

        // 5. Sync: collect finished pushes, queue the edge notice, then
        //    the periodic push
        self.sync.collect(outbox, sink);
        let input = SyncInput {
            now,
            snapshot: self.sampler.snapshot(),
            verdict,
            alert_active: new_state.is_alert(),
            episode: self.episodes,
        };
        if let Some(notice) = notice {
            self.sync.on_notice(notice, &input, outbox, clock, sink);
        }
        self.sync.poll(&input, outbox, clock, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current alert state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn snapshot(&self) -> &EnvironmentSnapshot {
        self.sampler.snapshot()
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Level most recently driven to the buzzer.
    pub fn alarm_output(&self) -> bool {
        self.alarm.output()
    }

    /// Hazard episodes started since boot.
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            state: self.fsm.current_state(),
            reason: self.ctx.reason,
            snapshot: *self.sampler.snapshot(),
            baseline: self.baseline,
            verdict: self.ctx.verdict,
            alarm_on: self.alarm.output(),
            episodes: self.episodes,
            sample_failures: self.sampler.total_failures(),
            sync: self.sync.stats(),
            tick_count: self.tick_count,
        }
    }
}
