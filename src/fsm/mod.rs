//! Function-pointer finite state machine for the alert state.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ StateId │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Safe    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Alert   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  └────────┴───────────┴──────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the current
//! pointer.  The engine is the only thing that changes the alert state.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::timer::Instant;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Alert state.  Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Safe = 0,
    Alert = 1,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 2;

    /// Convert an index back to `StateId`.  Out-of-range indices map to
    /// `Alert` in release builds (fail loud, not silent).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Safe,
            1 => Self::Alert,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Alert
            }
        }
    }

    pub fn is_alert(self) -> bool {
        self == Self::Alert
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick update.  Returns `Some(next)` to trigger a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    transitions: u32,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext, now: Instant) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        ctx.now = now;
        ctx.entered_at = now;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM for the tick at `ctx.now`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Jump to `next` immediately, running exit/enter actions.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Number of transitions since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);
        ctx.entered_at = ctx.now;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
