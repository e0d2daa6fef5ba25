//! Unified error types for the HazardWatch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! travel through events and logs without allocation.
//!
//! None of these are fatal.  Sensor errors fall back to the last good
//! reading, comms errors drop the single push, and an unsynced clock falls
//! back to uptime labels.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A remote push or the network link failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver signalled an invalid read (e.g. NaN from the library).
    InvalidReading,
    /// The sensor did not answer within its protocol timing.
    Timeout,
    /// Frame received but checksum mismatch.
    Checksum,
    /// GPIO access failed while talking to the sensor.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReading => write!(f, "invalid reading"),
            Self::Timeout => write!(f, "sensor timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Link is down; the push was not attempted.
    Offline,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection or transport level failure.
    RequestFailed,
    /// Server answered with a non-2xx status.
    HttpStatus(u16),
    /// Document could not be serialised.
    Encode,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Timeout => write!(f, "request timed out"),
            Self::RequestFailed => write!(f, "request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Encode => write!(f, "document encode failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
