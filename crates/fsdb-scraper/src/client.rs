//! HTTP transport for the Lozi listing API.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::fetcher::Fetcher;

/// `reqwest`-backed [`Fetcher`].
///
/// Every request is bounded by the configured timeout. Non-2xx responses are
/// surfaced as typed errors; there is no retry.
pub struct LoziClient {
    client: Client,
}

impl LoziClient {
    /// Creates a `LoziClient` with a per-request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for LoziClient {
    /// # Errors
    ///
    /// - [`ScraperError::NotFound`]: HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network, TLS or timeout failure.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
