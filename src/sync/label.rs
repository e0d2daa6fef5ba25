//! Timestamp labels and alert document keys.
//!
//! A label is the human-readable time attached to a document:
//!
//! - clock synced:   `"2024-01-15 14:23:01"` (UTC + configured offset)
//! - clock unsynced: `"uptime_00:01:05"` (hours are not wrapped at 24)
//!
//! Keys are labels made path-safe (`' '` → `_`, `':'` → `-`) and made
//! unique per episode within a boot.

use core::fmt::Write;

use chrono::{DateTime, Datelike, Timelike};

use crate::app::events::AlertKey;
use crate::app::ports::WallClock;

pub type Label = heapless::String<32>;

/// Format the label for a document written now.
pub fn format_label(clock: WallClock, uptime_ms: u64, utc_offset_secs: i32) -> Label {
    let mut out = Label::new();
    if clock.synced {
        let local = clock.unix_secs.saturating_add(i64::from(utc_offset_secs));
        if let Some(dt) = DateTime::from_timestamp(local, 0) {
            let _ = write!(
                out,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            );
            return out;
        }
    }
    let secs = uptime_ms / 1000;
    let _ = write!(
        out,
        "uptime_{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    out
}

/// Make a label safe for use as a path segment.
pub fn sanitize(label: &str) -> AlertKey {
    let mut out = AlertKey::new();
    for c in label.chars() {
        let c = match c {
            ' ' => '_',
            ':' => '-',
            other => other,
        };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Issues one unique key per alert episode.
///
/// Unsynced labels restart at `uptime_00:00:00` every boot, so the
/// episode number is appended.  Synced labels are unique unless two
/// episodes start within the same second; repeats get `_2`, `_3`, …
#[derive(Debug, Default)]
pub struct KeyAllocator {
    last_base: Option<AlertKey>,
    repeat: u16,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, label: &str, synced: bool, episode: u32) -> AlertKey {
        let mut key = sanitize(label);
        if !synced {
            let _ = write!(key, "_e{episode}");
            return key;
        }

        if self.last_base.as_ref() == Some(&key) {
            self.repeat = self.repeat.saturating_add(1);
            let _ = write!(key, "_{}", self.repeat);
        } else {
            self.repeat = 1;
            self.last_base = Some(key.clone());
        }
        key
    }
}
