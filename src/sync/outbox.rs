//! Hand-off between the control loop and the push I/O thread.
//!
//! Uses `embassy-sync` bounded channels so the synchronous tick never
//! touches the network.  The control loop encodes documents and
//! `try_send`s them; the I/O thread owns the [`RemotePort`], performs the
//! PUTs one at a time and sends back a [`PushReport`] for each.
//!
//! ```text
//! ┌──────────────┐  PushRequest  ┌──────────────┐
//! │ Control Loop │──────────────▶│  Push Task   │──▶ RemotePort
//! │  (tick)      │◀──────────────│  (I/O thread)│
//! └──────────────┘  PushReport   └──────────────┘
//!        ▲          link_up flag         │
//!        └───────────────────────────────┘
//! ```
//!
//! Nothing on the control-loop side waits: a full request channel drops
//! the push, an empty report channel returns `None`.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, warn};

use crate::app::events::AlertKey;
use crate::app::ports::RemotePort;
use crate::error::CommsError;
use crate::hazard::AlertReason;

/// Requests in flight between the tick and the I/O thread.  One alert
/// entry queues at most three (record, `/sensor`, periodic).
pub const REQUEST_DEPTH: usize = 4;

/// Completed pushes waiting for the next tick to collect them.
pub const REPORT_DEPTH: usize = 8;

/// Document path relative to the database root.
pub type PushPath = heapless::String<64>;

/// Alert record riding along with a request, so the report can name it.
pub type AlertTag = (AlertReason, AlertKey);

/// One encoded document waiting to be PUT.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest {
    pub path: PushPath,
    /// Path family for logs and events (`/sensor` or `/alerts`).
    pub tag: &'static str,
    pub body: Vec<u8>,
    pub alert: Option<AlertTag>,
}

/// Outcome of one [`PushRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct PushReport {
    pub tag: &'static str,
    pub alert: Option<AlertTag>,
    pub result: Result<(), CommsError>,
}

pub struct Outbox {
    requests: Channel<CriticalSectionRawMutex, PushRequest, REQUEST_DEPTH>,
    reports: Channel<CriticalSectionRawMutex, PushReport, REPORT_DEPTH>,
    link_up: AtomicBool,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox {
    /// `const` so the binary can keep one in a `static`.
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            reports: Channel::new(),
            link_up: AtomicBool::new(false),
        }
    }

    /// Link state as last published by the I/O thread.
    pub fn link_up(&self) -> bool {
        self.link_up.load(Ordering::Acquire)
    }

    pub fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::Release);
    }

    // ── Control-loop side ─────────────────────────────────────

    /// Queue a request.  Hands it back when the channel is full.
    pub fn try_submit(&self, request: PushRequest) -> Result<(), PushRequest> {
        self.requests
            .try_send(request)
            .map_err(|TrySendError::Full(r)| r)
    }

    pub fn try_report(&self) -> Option<PushReport> {
        self.reports.try_receive().ok()
    }

    /// Requests not yet picked up by the I/O thread.
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    // ── I/O side ──────────────────────────────────────────────

    pub fn try_next(&self) -> Option<PushRequest> {
        self.requests.try_receive().ok()
    }

    fn report(&self, report: PushReport) {
        if self.reports.try_send(report).is_err() {
            warn!("outbox: report channel full, outcome lost");
        }
    }
}

/// PUT one request and report the outcome.  Blocks for as long as the
/// remote does, so only the I/O thread calls this.
pub fn deliver(outbox: &Outbox, remote: &mut impl RemotePort, request: PushRequest) {
    debug!("PUT {} ({} bytes)", request.path, request.body.len());
    let result = remote.put(&request.path, &request.body);
    outbox.set_link_up(remote.is_connected());
    outbox.report(PushReport {
        tag: request.tag,
        alert: request.alert,
        result,
    });
}

/// Publish the link state, then deliver everything queued.  Returns the
/// number of requests handled.
pub fn deliver_pending(outbox: &Outbox, remote: &mut impl RemotePort) -> usize {
    outbox.set_link_up(remote.is_connected());
    let mut handled = 0;
    while let Some(request) = outbox.try_next() {
        deliver(outbox, remote, request);
        handled += 1;
    }
    handled
}
