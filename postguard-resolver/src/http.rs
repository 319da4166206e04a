//! HTTPS collaborator contract and the reqwest-backed implementation.
//!
//! Policy documents are fetched with a single GET; the engine only
//! needs the status, a printable status line for error reporting, and
//! the decoded body text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ResolveError;

/// A fetched HTTPS response.
#[derive(Debug, Clone)]
pub struct HttpsResponse {
    /// Numeric status code.
    pub status: u16,
    /// Printable status line, e.g. `HTTP/1.1 404 Not Found`.
    pub status_line: String,
    /// Decoded body text.
    pub body: String,
}

impl HttpsResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTPS fetch collaborator.
///
/// `Err` is reserved for transport failures; a response with a
/// non-success status is still `Ok` and judged by the caller.
#[async_trait]
pub trait HttpsFetch: Send + Sync {
    /// Performs a GET against `url`.
    async fn get(&self, url: &str) -> Result<HttpsResponse, ResolveError>;
}

/// Production [`HttpsFetch`] backed by a pooled reqwest client.
#[derive(Debug)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Creates a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout_secs: u64) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpsFetch for ReqwestFetch {
    async fn get(&self, url: &str) -> Result<HttpsResponse, ResolveError> {
        debug!("Fetching {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let status_line = format!("{:?} {status}", response.version());
        let body = response.text().await?;

        Ok(HttpsResponse {
            status: status.as_u16(),
            status_line,
            body,
        })
    }
}
