//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the logger (UART in production), so an operator on the
//! serial console can follow calibration, transitions and push failures.

use log::{info, warn};

use crate::app::events::{AppEvent, NoticeKind};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since boot.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::Calibrated { baseline, samples } => {
                info!("CALIB | gas_baseline={} samples={}", baseline, samples);
            }
            AppEvent::SampleFailed(e) => {
                warn!("SENSE | climate read failed: {}", e);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::AlertPublished { reason, key } => {
                info!("ALERT | {} stored as /alerts/{}", reason.as_str(), key);
            }
            AppEvent::NoticeDropped(kind) => {
                let what = match kind {
                    NoticeKind::Alert => "alert",
                    NoticeKind::SafeReset => "safe reset",
                };
                warn!("PUSH  | offline, {} notice dropped", what);
            }
            AppEvent::PushFailed { path, error } => {
                warn!("PUSH  | {} failed: {}", path, error);
            }
            AppEvent::PushDropped { path } => {
                warn!("PUSH  | {} dropped, push task backlogged", path);
            }
        }
    }
}
