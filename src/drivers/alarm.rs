//! Alarm pulse pattern.
//!
//! Generates the buzzer level from the alert state and elapsed time.
//! While active the output repeats ON for `on_ms`, OFF for `off_ms`,
//! toggling when the current phase has lasted its full duration.  While
//! inactive the output is forced OFF and the phase is forgotten, so the
//! next activation always starts with an ON phase.
//!
//! ```text
//!  active:  ──┐ ON 300 ┌ OFF 200 ┐ ON 300 ┌ ...
//!  output:    └────────┘         └────────┘
//! ```

use crate::timer::Instant;

pub struct AlarmPattern {
    on_ms: u32,
    off_ms: u32,
    output: bool,
    /// Start of the current phase; `None` while inactive.
    phase_start: Option<Instant>,
    cycles: u32,
}

impl AlarmPattern {
    pub fn new(on_ms: u32, off_ms: u32) -> Self {
        Self {
            on_ms,
            off_ms,
            output: false,
            phase_start: None,
            cycles: 0,
        }
    }

    /// Advance the pattern and return the level to drive this tick.
    pub fn update(&mut self, active: bool, now: Instant) -> bool {
        if !active {
            self.output = false;
            self.phase_start = None;
            return false;
        }

        match self.phase_start {
            None => {
                self.output = true;
                self.phase_start = Some(now);
                self.cycles = self.cycles.wrapping_add(1);
            }
            Some(start) => {
                let phase_len = if self.output { self.on_ms } else { self.off_ms };
                if now.elapsed_since(start) >= phase_len {
                    self.output = !self.output;
                    self.phase_start = Some(now);
                    if self.output {
                        self.cycles = self.cycles.wrapping_add(1);
                    }
                }
            }
        }
        self.output
    }

    pub fn output(&self) -> bool {
        self.output
    }

    /// ON phases started since boot.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}
