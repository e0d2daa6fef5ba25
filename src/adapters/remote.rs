//! Remote document store adapter (HTTPS PUT).
//!
//! Implements [`RemotePort`] on top of any [`ConnectivityPort`]: every
//! document is written with a single `PUT {database_url}{path}.json`,
//! bounded by `remote.timeout_ms`.  No retries, no queueing.
//!
//! On non-espidf targets the request is recorded instead of sent, and
//! failures can be injected per call.

use log::{debug, warn};

use crate::adapters::wifi::ConnectivityPort;
use crate::app::ports::RemotePort;
use crate::config::RemoteConfig;
use crate::error::CommsError;

/// Longest URL we build: base (96) + path (~56) + `.json` + `?auth=` + token (128).
pub const MAX_URL_LEN: usize = 300;

pub type Url = heapless::String<MAX_URL_LEN>;

/// `{base}{path}.json`, with `?auth={token}` when a token is set.
pub fn build_url(base: &str, path: &str, token: &str) -> Result<Url, CommsError> {
    let mut url = Url::new();
    let base = base.trim_end_matches('/');
    url.push_str(base).map_err(|_| CommsError::Encode)?;
    if !path.starts_with('/') {
        url.push('/').map_err(|_| CommsError::Encode)?;
    }
    url.push_str(path).map_err(|_| CommsError::Encode)?;
    url.push_str(".json").map_err(|_| CommsError::Encode)?;
    if !token.is_empty() {
        url.push_str("?auth=").map_err(|_| CommsError::Encode)?;
        url.push_str(token).map_err(|_| CommsError::Encode)?;
    }
    Ok(url)
}

/// One recorded request (simulation only).
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimRequest {
    pub url: String,
    pub body: Vec<u8>,
}

pub struct HttpRemote<C: ConnectivityPort> {
    link: C,
    config: RemoteConfig,
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<SimRequest>,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: Option<CommsError>,
}

impl<C: ConnectivityPort> HttpRemote<C> {
    pub fn new(link: C, config: RemoteConfig) -> Self {
        if config.database_url.is_empty() {
            warn!("remote: no database URL configured, pushes disabled");
        }
        Self {
            link,
            config,
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_fail_next: None,
        }
    }

    /// The underlying link, for the main loop to poll.
    pub fn link_mut(&mut self) -> &mut C {
        &mut self.link
    }

    pub fn link(&self) -> &C {
        &self.link
    }

    #[cfg(target_os = "espidf")]
    fn send(&mut self, url: &str, body: &[u8]) -> Result<(), CommsError> {
        use core::time::Duration;
        use embedded_svc::http::client::Client;
        use embedded_svc::http::{Method, Status};
        use embedded_svc::io::Write;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let conf = Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.config.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|_| CommsError::RequestFailed)?;
        let mut client = Client::wrap(conn);

        let len = content_length(body.len());
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", len.as_str()),
        ];
        let mut request = client
            .request(Method::Put, url, &headers)
            .map_err(|_| CommsError::RequestFailed)?;
        request.write_all(body).map_err(map_io)?;
        request.flush().map_err(map_io)?;
        let response = request.submit().map_err(map_io)?;
        let status = response.status();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(CommsError::HttpStatus(status))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn send(&mut self, url: &str, body: &[u8]) -> Result<(), CommsError> {
        if let Some(e) = self.sim_fail_next.take() {
            return Err(e);
        }
        self.sim_sent.push(SimRequest {
            url: url.into(),
            body: body.to_vec(),
        });
        Ok(())
    }

    /// Simulation: make the next request fail with `error`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, error: CommsError) {
        self.sim_fail_next = Some(error);
    }

    /// Simulation: requests sent so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[SimRequest] {
        &self.sim_sent
    }
}

#[cfg(target_os = "espidf")]
fn content_length(n: usize) -> heapless::String<20> {
    use core::fmt::Write as _;
    let mut s = heapless::String::new();
    let _ = write!(s, "{}", n);
    s
}

#[cfg(target_os = "espidf")]
fn map_io(e: esp_idf_svc::io::EspIOError) -> CommsError {
    if e.0.code() == esp_idf_svc::sys::ESP_ERR_TIMEOUT {
        CommsError::Timeout
    } else {
        CommsError::RequestFailed
    }
}

impl<C: ConnectivityPort> RemotePort for HttpRemote<C> {
    fn is_connected(&self) -> bool {
        !self.config.database_url.is_empty() && self.link.is_connected()
    }

    fn put(&mut self, path: &str, body: &[u8]) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::Offline);
        }
        let url = build_url(&self.config.database_url, path, &self.config.auth_token)?;
        debug!("remote: PUT {} ({} bytes)", path, body.len());
        self.send(&url, body)
    }
}
