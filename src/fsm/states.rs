//! Concrete state handler functions and table builder.
//!
//! ```text
//!  SAFE ──[hazard]──▶ ALERT
//!    ▲                  │
//!    └──[non-hazard for safe_hold_ms]
//! ```
//!
//! Entry into ALERT raises exactly one `Notice::Raised` for the episode.
//! Leaving ALERT raises `Notice::Cleared`.  Sustained hazard inside ALERT
//! raises nothing.

use super::context::{FsmContext, Notice};
use super::{StateDescriptor, StateId};
use crate::hazard::AlertReason;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Safe
        StateDescriptor {
            id: StateId::Safe,
            name: "Safe",
            on_enter: Some(safe_enter),
            on_exit: None,
            on_update: safe_update,
        },
        // Index 1: Alert
        StateDescriptor {
            id: StateId::Alert,
            name: "Alert",
            on_enter: Some(alert_enter),
            on_exit: Some(alert_exit),
            on_update: alert_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  SAFE state
// ═══════════════════════════════════════════════════════════════════════════

fn safe_enter(ctx: &mut FsmContext) {
    ctx.reason = None;
    ctx.clear_since = None;
}

fn safe_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.verdict.hazard {
        return Some(StateId::Alert);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALERT state
// ═══════════════════════════════════════════════════════════════════════════

fn alert_enter(ctx: &mut FsmContext) {
    ctx.clear_since = None;
    // Forced entry without a hazard verdict reports as gas.
    let reason = ctx.verdict.reason().unwrap_or(AlertReason::GasHigh);
    ctx.reason = Some(reason);
    ctx.notice = Some(Notice::Raised(reason));
    info!("ALERT raised: {}", reason.as_str());
}

fn alert_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.verdict.hazard {
        if ctx.clear_since.take().is_some() {
            debug!("hazard returned; dwell window reset");
        }
        return None;
    }

    if ctx.clear_since.is_none() {
        ctx.clear_since = Some(ctx.now);
        debug!("hazard cleared; holding ALERT for {} ms", ctx.safe_hold_ms);
    }

    if ctx.clear_for_ms() >= ctx.safe_hold_ms {
        return Some(StateId::Safe);
    }
    None
}

fn alert_exit(ctx: &mut FsmContext) {
    info!(
        "ALERT cleared after {} ms of safe readings ({} ms in alert)",
        ctx.clear_for_ms(),
        ctx.ms_in_state()
    );
    ctx.notice = Some(Notice::Cleared);
}
