//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, buzzer, remote store, clock, storage, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.

use crate::config::SystemConfig;
use crate::error::{CommsError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw readings.
pub trait SensorPort {
    /// Calibrated `(temperature °C, relative humidity %)`, or the reason
    /// the read failed.
    fn read_climate(&mut self) -> Result<(f32, f32), SensorError>;

    /// Raw gas sensor ADC counts (0 – 4095).  Never fails; an absent
    /// sensor reads 0.
    fn read_gas_raw(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Alarm port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the audible alarm.
pub trait AlarmPort {
    /// Drive the buzzer.  Called every tick; implementations should
    /// only touch the pin when the level changes.
    fn set_alarm(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Remote port (driven adapter: domain → document store)
// ───────────────────────────────────────────────────────────────

/// Best-effort document store.
///
/// Driven by the push task on its own thread via
/// [`outbox::deliver`](crate::sync::outbox::deliver), never from the
/// tick.  `put` should still return within the adapter's configured
/// timeout so the queue keeps moving.  Nothing retries; a failed push is
/// simply dropped.
pub trait RemotePort {
    fn is_connected(&self) -> bool;

    /// Overwrite the document at `path` (e.g. `/sensor`) with `body`
    /// (UTF-8 JSON).
    fn put(&mut self, path: &str, body: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC / SNTP → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock reading, used only for document labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallClock {
    /// Seconds since the Unix epoch (UTC).  Meaningless when `!synced`.
    pub unix_secs: i64,
    /// True once time has been obtained from the network.
    pub synced: bool,
}

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    fn wall_clock(&self) -> WallClock;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration, including the network
/// credentials provisioned at install time.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
