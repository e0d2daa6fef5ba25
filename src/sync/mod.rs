//! Remote synchronisation.
//!
//! Two kinds of push share the same best-effort transport:
//!
//! - **Edge-triggered**: one alert document per episode (plus a `/sensor`
//!   update carrying `alertTime`) and one safe-reset `/sensor` update.
//!   Queued immediately, bypassing the periodic gate, and only if the link
//!   is up.  Offline notices are dropped, never queued.
//! - **Periodic**: the live `/sensor` document, at most once per
//!   `push_interval_ms` while connected.
//!
//! The scheduler only encodes documents and hands them to the
//! [`Outbox`]; the PUTs run on the push I/O thread.  Every push is
//! attempted exactly once.  Failures come back as reports, are emitted
//! through the event sink and forgotten.

pub mod documents;
pub mod label;
pub mod outbox;

use log::{info, warn};
use serde::Serialize;

use crate::app::events::{AlertKey, AppEvent, NoticeKind};
use crate::app::ports::{ClockPort, EventSink};
use crate::error::CommsError;
use crate::fsm::context::{EnvironmentSnapshot, Notice};
use crate::hazard::{AlertReason, HazardVerdict};
use crate::timer::{Instant, IntervalTimer};
use documents::{ALERTS_PATH, AlertDocument, SENSOR_PATH, SensorDocument, encode};
use label::{KeyAllocator, format_label};
use outbox::{AlertTag, Outbox, PushPath, PushReport, PushRequest};

/// Domain state a push needs, captured after the FSM ran this tick.
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    pub now: Instant,
    pub snapshot: &'a EnvironmentSnapshot,
    pub verdict: HazardVerdict,
    pub alert_active: bool,
    /// Sequence number of the current (or last) episode, starting at 1.
    pub episode: u32,
}

/// Push counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub pushed: u32,
    pub failed: u32,
    pub dropped_notices: u32,
    /// Pushes dropped because the outbox was full.
    pub overflowed: u32,
}

pub struct SyncScheduler {
    push_timer: IntervalTimer,
    keys: KeyAllocator,
    utc_offset_secs: i32,
    stats: SyncStats,
}

impl SyncScheduler {
    pub fn new(push_interval_ms: u32, utc_offset_secs: i32) -> Self {
        Self {
            push_timer: IntervalTimer::new(push_interval_ms),
            keys: KeyAllocator::new(),
            utc_offset_secs,
            stats: SyncStats::default(),
        }
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Drain the outcomes of pushes finished since the last call.
    pub fn collect(&mut self, outbox: &Outbox, sink: &mut impl EventSink) {
        while let Some(PushReport { tag, alert, result }) = outbox.try_report() {
            match (result, alert) {
                (Ok(()), Some((reason, key))) => {
                    self.stats.pushed = self.stats.pushed.wrapping_add(1);
                    info!("alert {} published as {}", reason.as_str(), key);
                    sink.emit(&AppEvent::AlertPublished { reason, key });
                }
                (Ok(()), None) => {
                    self.stats.pushed = self.stats.pushed.wrapping_add(1);
                }
                (Err(e), _) => self.fail(tag, e, sink),
            }
        }
    }

    /// Queue an edge-triggered notice.  Returns the alert key when an
    /// alert document was queued.
    pub fn on_notice(
        &mut self,
        notice: Notice,
        input: &SyncInput<'_>,
        outbox: &Outbox,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Option<AlertKey> {
        let kind = match notice {
            Notice::Raised(_) => NoticeKind::Alert,
            Notice::Cleared => NoticeKind::SafeReset,
        };
        if !outbox.link_up() {
            self.stats.dropped_notices = self.stats.dropped_notices.wrapping_add(1);
            warn!("link down, {:?} notice dropped", kind);
            sink.emit(&AppEvent::NoticeDropped(kind));
            return None;
        }

        let wall = clock.wall_clock();
        let label = format_label(wall, clock.uptime_ms(), self.utc_offset_secs);

        match notice {
            Notice::Raised(reason) => {
                let key = self.keys.next(&label, wall.synced, input.episode);
                let queued = self.queue_alert(reason, &key, &label, input, outbox, sink);
                let doc = SensorDocument::alert(input.snapshot, input.verdict, &label);
                self.queue(sensor_path(), SENSOR_PATH, &doc, None, outbox, sink);
                queued.then_some(key)
            }
            Notice::Cleared => {
                let doc = SensorDocument::live(input.snapshot, input.verdict, false, &label);
                if self.queue(sensor_path(), SENSOR_PATH, &doc, None, outbox, sink) {
                    info!("safe reset queued at {}", label);
                }
                None
            }
        }
    }

    /// Periodic live push.  The interval only advances while connected,
    /// so the first tick after a reconnect pushes straight away.
    pub fn poll(
        &mut self,
        input: &SyncInput<'_>,
        outbox: &Outbox,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !outbox.link_up() || !self.push_timer.fire_if_due(input.now) {
            return false;
        }
        let label = format_label(clock.wall_clock(), clock.uptime_ms(), self.utc_offset_secs);
        let doc = SensorDocument::live(input.snapshot, input.verdict, input.alert_active, &label);
        self.queue(sensor_path(), SENSOR_PATH, &doc, None, outbox, sink)
    }

    fn queue_alert(
        &mut self,
        reason: AlertReason,
        key: &AlertKey,
        label: &str,
        input: &SyncInput<'_>,
        outbox: &Outbox,
        sink: &mut impl EventSink,
    ) -> bool {
        let mut path = PushPath::new();
        let built = path.push_str(ALERTS_PATH).is_ok()
            && path.push('/').is_ok()
            && path.push_str(key).is_ok();
        if !built {
            self.fail(ALERTS_PATH, CommsError::Encode, sink);
            return false;
        }
        let doc = AlertDocument::new(input.snapshot, input.verdict, reason, label);
        let tag = (reason, key.clone());
        self.queue(path, ALERTS_PATH, &doc, Some(tag), outbox, sink)
    }

    fn queue<T: Serialize>(
        &mut self,
        path: PushPath,
        tag: &'static str,
        doc: &T,
        alert: Option<AlertTag>,
        outbox: &Outbox,
        sink: &mut impl EventSink,
    ) -> bool {
        let body = match encode(doc) {
            Ok(body) => body,
            Err(e) => {
                self.fail(tag, e, sink);
                return false;
            }
        };
        let request = PushRequest {
            path,
            tag,
            body,
            alert,
        };
        if outbox.try_submit(request).is_err() {
            self.stats.overflowed = self.stats.overflowed.wrapping_add(1);
            warn!("outbox full, push to {} dropped", tag);
            sink.emit(&AppEvent::PushDropped { path: tag });
            return false;
        }
        true
    }

    fn fail(&mut self, tag: &'static str, error: CommsError, sink: &mut impl EventSink) {
        self.stats.failed = self.stats.failed.wrapping_add(1);
        warn!("push to {} failed: {}", tag, error);
        sink.emit(&AppEvent::PushFailed { path: tag, error });
    }
}

fn sensor_path() -> PushPath {
    let mut path = PushPath::new();
    // "/sensor" always fits.
    let _ = path.push_str(SENSOR_PATH);
    path
}
