//! Monotonic uptime instants and interval guards.
//!
//! Every periodic activity in the tick loop (sampling, live push, alarm
//! phase, safe-hold dwell) measures time as a [`Instant`]: milliseconds of
//! device uptime truncated to `u32`.  The counter wraps every ~49.7 days,
//! so absolute values are never compared directly; all durations come from
//! [`Instant::elapsed_since`], which uses wrapping subtraction.
//!
//! Wall-clock time is not used here.  It only labels remote documents
//! (see [`crate::sync::label`]).

/// A point on the monotonic uptime axis (milliseconds, wrapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instant(u32);

impl Instant {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// Truncate a 64-bit uptime to the wrapping 32-bit timeline.
    pub const fn from_uptime_ms(uptime_ms: u64) -> Self {
        Self(uptime_ms as u32)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, correct across one wrap.
    pub const fn elapsed_since(self, earlier: Instant) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn offset(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// "Last fired at" guard for a periodic activity.
///
/// The first check always fires so that a freshly booted device samples
/// and publishes immediately instead of waiting a full period.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    period_ms: u32,
    last: Option<Instant>,
}

impl IntervalTimer {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last: None,
        }
    }

    /// Returns `true` (and records `now`) at most once per call when the
    /// period has elapsed since the previous fire.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.elapsed_since(last) >= self.period_ms,
        };
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last
    }
}
