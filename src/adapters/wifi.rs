//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the boundary the remote adapter
//! uses to decide whether a push is worth attempting.  Nothing here
//! blocks: `poll()` is called from the main loop every iteration and
//! advances a small state machine.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in its
//!   non-blocking form (`connect()` returns immediately, link state is
//!   polled).
//! - **all other targets**: a simulated link controlled by the test.
//!
//! ## Reconnection policy
//!
//! A failed or lost connection waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.  A successful connection resets
//! the backoff.

use core::fmt;
use log::{info, warn};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;
    /// Advance connection management.  Must not block.
    fn poll(&mut self, now_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    /// No credentials, or not started yet.
    Idle,
    /// Association in progress since `since_ms`.
    Connecting { since_ms: u64, attempt: u32 },
    Connected,
    /// Waiting until `retry_at_ms` before the next attempt.
    Backoff { retry_at_ms: u64, attempt: u32 },
}

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;
/// Give up on an association attempt after this long.
const CONNECT_TIMEOUT_MS: u64 = 15_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u32,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_calls: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Idle,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Idle,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            sim_link_up: false,
            sim_connect_calls: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Current backoff applied to the next failure.
    pub fn backoff_ms(&self) -> u32 {
        self.backoff_ms
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    fn begin_attempt(&mut self, now_ms: u64, attempt: u32) {
        info!("WiFi: connecting to '{}' (attempt {})", self.ssid, attempt + 1);
        match self.platform_begin_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting {
                    since_ms: now_ms,
                    attempt,
                };
            }
            Err(e) => {
                warn!("WiFi: connect request failed: {}", e);
                self.schedule_retry(now_ms, attempt);
            }
        }
    }

    fn schedule_retry(&mut self, now_ms: u64, attempt: u32) {
        let retry_at_ms = now_ms + u64::from(self.backoff_ms);
        info!("WiFi: retry in {} ms", self.backoff_ms);
        self.backoff_ms = self.backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        self.state = WifiState::Backoff {
            retry_at_ms,
            attempt: attempt.saturating_add(1),
        };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let ssid = self
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        let password = self
            .password
            .as_str()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        let cfg = Configuration::Client(ClientConfiguration {
            ssid,
            password,
            auth_method,
            ..Default::default()
        });

        let _ = self.wifi.disconnect();
        self.wifi
            .set_configuration(&cfg)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi
                .start()
                .map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.wifi
            .connect()
            .map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_connect_calls = self.sim_connect_calls.wrapping_add(1);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.sim_link_up
    }

    /// Simulation: raise or drop the access point link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_link_up(&mut self, up: bool) {
        self.sim_link_up = up;
    }

    /// Simulation: association requests issued so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect_calls(&self) -> u32 {
        self.sim_connect_calls
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_link_up()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Idle => {
                if !self.ssid.is_empty() {
                    self.begin_attempt(now_ms, 0);
                }
            }
            WifiState::Connecting { since_ms, attempt } => {
                if self.platform_link_up() {
                    info!("WiFi: connected");
                    self.state = WifiState::Connected;
                    self.backoff_ms = INITIAL_BACKOFF_MS;
                } else if now_ms.saturating_sub(since_ms) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.schedule_retry(now_ms, attempt);
                }
            }
            WifiState::Connected => {
                if !self.platform_link_up() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(now_ms, 0);
                }
            }
            WifiState::Backoff { retry_at_ms, attempt } => {
                if now_ms >= retry_at_ms {
                    self.begin_attempt(now_ms, attempt);
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
