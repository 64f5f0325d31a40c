//! Outbound HTTP with an optional offline guard.
//!
//! The guard replaces ambient network access with an explicit allowlist:
//! the harness constructs either a plain or a guarded client at startup
//! and threads it through every provider. A blocked request fails before
//! dispatch; nothing ever reaches the socket layer.

use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("txshield/", env!("CARGO_PKG_VERSION"));

/// Allowlist for outbound requests, installed once at startup when the
/// operator runs with `--offline` / `--rpc-only`.
#[derive(Debug, Clone, Default)]
pub struct OfflineGuard {
    allowed: Vec<Url>,
    allow_localhost: bool,
}

impl OfflineGuard {
    pub fn new(allowed: Vec<Url>, allow_localhost: bool) -> Self {
        OfflineGuard {
            allowed,
            allow_localhost,
        }
    }

    /// Whether `url` may leave the process.
    pub fn permits(&self, url: &Url) -> bool {
        if self.allow_localhost {
            if let Some(host) = url.host_str() {
                if host == "localhost" || host == "127.0.0.1" || host == "[::1]" {
                    return true;
                }
            }
        }
        self.allowed.iter().any(|allowed| allowed == url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The offline guard refused the URL. Raised before dispatch.
    #[error("blocked HTTP request to {0}")]
    Blocked(Url),
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: Url, status: u16 },
}

/// The HTTP client handed to every provider.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    guard: Option<OfflineGuard>,
}

impl HttpClient {
    /// A plain client with sane timeouts and no guard.
    pub fn new() -> Self {
        HttpClient {
            inner: Client::builder()
                .user_agent(USER_AGENT)
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            guard: None,
        }
    }

    /// A guarded client; requests off the allowlist fail with
    /// [`HttpError::Blocked`].
    pub fn guarded(guard: OfflineGuard) -> Self {
        let mut client = HttpClient::new();
        client.guard = Some(guard);
        client
    }

    fn check(&self, url: &Url) -> Result<(), HttpError> {
        if let Some(guard) = &self.guard {
            if !guard.permits(url) {
                return Err(HttpError::Blocked(url.clone()));
            }
        }
        Ok(())
    }

    pub async fn get_json(&self, url: Url) -> Result<JsonValue, HttpError> {
        self.check(&url)?;
        let response = self.inner.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(HttpError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn post_json(&self, url: Url, body: &JsonValue) -> Result<JsonValue, HttpError> {
        self.check(&url)?;
        let response = self.inner.post(url.clone()).json(body).send().await?;
        if !response.status().is_success() {
            return Err(HttpError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    /// Forwards a raw body and returns the raw reply. Used by the proxy,
    /// which must not re-serialize upstream traffic.
    pub async fn post_raw(
        &self,
        url: Url,
        body: Vec<u8>,
    ) -> Result<(u16, Vec<u8>), HttpError> {
        self.check(&url)?;
        let response = self
            .inner
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        HttpClient::new()
    }
}
