//! Shared data threaded through the alert FSM handlers.
//!
//! `FsmContext` is the blackboard the state handlers read from and write
//! to: the current tick time, this tick's hazard verdict, the safe-hold
//! dwell reference, and the one-shot notice raised by a transition.  The
//! environment snapshot and gas baseline also live here since every
//! component reads them.

use crate::hazard::{AlertReason, HazardVerdict};
use crate::timer::Instant;

// ---------------------------------------------------------------------------
// Environment snapshot (written by the sample acquirer only)
// ---------------------------------------------------------------------------

/// Latest environmental readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentSnapshot {
    /// Air temperature (°C).  Last known good value on read failure.
    pub temperature_c: f32,
    /// Relative humidity (%).  Last known good value on read failure.
    pub humidity_pct: f32,
    /// Raw gas sensor ADC counts (0 – 4095).
    pub gas_raw: u16,
    /// Uptime at which the snapshot was last refreshed.
    pub sampled_at: Instant,
}

/// Clean-air gas reference, fixed for the lifetime of a boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Baseline {
    pub gas: u16,
}

// ---------------------------------------------------------------------------
// Transition notices (written by state handlers; drained by the service)
// ---------------------------------------------------------------------------

/// Edge-triggered side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// SAFE → ALERT; first detection of a hazard episode.
    Raised(AlertReason),
    /// ALERT → SAFE after the dwell window.
    Cleared,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Uptime of the tick being processed.
    pub now: Instant,
    /// Uptime at which the current state was entered.
    pub entered_at: Instant,
    /// Required continuous non-hazard time before leaving ALERT.
    pub safe_hold_ms: u32,
    /// Start of the current non-hazard run while in ALERT.
    /// `None` while the hazard persists.
    pub clear_since: Option<Instant>,

    // -- Inputs --
    pub verdict: HazardVerdict,

    // -- Outputs --
    /// Reason of the episode in progress (set on ALERT entry).
    pub reason: Option<AlertReason>,
    /// At most one notice per tick; taken by the service after `tick()`.
    pub notice: Option<Notice>,
}

impl FsmContext {
    pub fn new(safe_hold_ms: u32) -> Self {
        Self {
            now: Instant::default(),
            entered_at: Instant::default(),
            safe_hold_ms,
            clear_since: None,
            verdict: HazardVerdict::default(),
            reason: None,
            notice: None,
        }
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u32 {
        self.now.elapsed_since(self.entered_at)
    }

    /// Milliseconds of continuous non-hazard so far (0 while hazardous).
    pub fn clear_for_ms(&self) -> u32 {
        self.clear_since
            .map_or(0, |since| self.now.elapsed_since(since))
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
