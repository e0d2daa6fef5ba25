//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The serial log adapter
//! renders them for the operator.

use crate::error::{CommsError, SensorError};
use crate::fsm::StateId;
use crate::hazard::AlertReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// Boot-time gas baseline established.
    Calibrated { baseline: u16, samples: u16 },

    /// A climate read failed; the last good values were kept.
    SampleFailed(SensorError),

    /// The alert FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The alert document for a new episode was stored remotely.
    AlertPublished { reason: AlertReason, key: AlertKey },

    /// An edge-triggered notice could not be sent because the link was
    /// down.  It is not queued.
    NoticeDropped(NoticeKind),

    /// A best-effort push failed and was dropped.
    PushFailed { path: &'static str, error: CommsError },

    /// The push task was still busy and its queue full; the document was
    /// dropped without being sent.
    PushDropped { path: &'static str },
}

/// Which edge-triggered notice was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Alert,
    SafeReset,
}

/// Remote key for an alert document.
pub type AlertKey = heapless::String<48>;
