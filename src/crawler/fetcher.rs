//! HTTP page fetcher
//!
//! This module handles every request made during a harvest:
//! - Building the HTTP client with browser-like headers and TLS roots
//! - Fetching one search page per call
//! - Retrying failed attempts with exponential backoff
//! - Classifying errors
//!
//! A fetch never returns an error. Exhausted retries and cancellation are
//! values of [`FetchOutcome`] that the caller must handle.

use crate::config::{Config, FetcherConfig, DEFAULT_USER_AGENT};
use crate::crawler::gate::AdmissionGate;
use crate::model::{PageRequest, SearchPage};
use crate::url::SearchUrl;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("admission gate closed")]
    GateClosed,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Result of fetching one page
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page was fetched and parsed
    Page(SearchPage),

    /// Every attempt failed; the page contributes no rows
    Failed {
        /// Attempts made before giving up
        attempts: u32,
        /// Error of the last attempt
        last_error: FetchError,
    },

    /// The run was cancelled before the page could be fetched
    Cancelled,
}

impl FetchOutcome {
    /// Returns the page if the fetch succeeded
    pub fn into_page(self) -> Option<SearchPage> {
        match self {
            FetchOutcome::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

/// Builds the HTTP client shared by all fetches
///
/// Certificates are checked against the bundled web PKI roots; there is
/// no fallback to unverified TLS.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (TLS backend, bad header)
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    // Header values with control characters fall back to the built-in defaults
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.api.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_str(&config.api.accept)
            .unwrap_or_else(|_| HeaderValue::from_static("application/json")),
    );

    Client::builder()
        .default_headers(headers)
        .timeout(config.fetcher.timeout())
        .connect_timeout(Duration::from_secs(10))
        .use_rustls_tls()
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches search pages through the shared admission gate
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    urls: SearchUrl,
    gate: AdmissionGate,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, urls: SearchUrl, gate: AdmissionGate, config: &FetcherConfig) -> Self {
        Self {
            client,
            urls,
            gate,
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Fetches one page with retries
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout, connection error | Retry |
    /// | Non-2xx status | Retry |
    /// | Unreadable body, invalid JSON | Retry |
    /// | Gate closed | Give up immediately |
    /// | Cancelled | Stop, return `Cancelled` |
    ///
    /// The delay before retry `n` is `initial_backoff * 2^(n-1)`.
    pub async fn fetch(&self, request: &PageRequest, cancel: &CancellationToken) -> FetchOutcome {
        let url = self.urls.page_url(request);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return FetchOutcome::Cancelled,
                result = self.attempt(&url) => result,
            };

            let error = match result {
                Ok(page) => {
                    tracing::debug!(
                        term = %request.term,
                        page = request.page,
                        attempt,
                        docs = page.docs.len(),
                        "Fetched page"
                    );
                    return FetchOutcome::Page(page);
                }
                Err(e) => e,
            };

            if attempt >= self.max_attempts || error == FetchError::GateClosed {
                tracing::error!(
                    url = %url,
                    attempts = attempt,
                    error = %error,
                    "Giving up on {}",
                    request
                );
                return FetchOutcome::Failed {
                    attempts: attempt,
                    last_error: error,
                };
            }

            let delay = self.backoff_delay(attempt);
            tracing::warn!(
                term = %request.term,
                page = request.page,
                attempt,
                max = self.max_attempts,
                ?delay,
                error = %error,
                "Fetch attempt failed; backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return FetchOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Delay after the given failed attempt (1-based)
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }

    /// One gated network attempt: send, check status, read and parse body
    async fn attempt(&self, url: &Url) -> Result<SearchPage, FetchError> {
        self.gate
            .admit(async {
                let response = self.client.get(url.clone()).send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }

                // Parse whatever Content-Type the server declares
                let body = response.bytes().await?;
                let page = serde_json::from_slice::<SearchPage>(&body)
                    .map_err(|e| FetchError::InvalidJson(e.to_string()))?;
                Ok::<SearchPage, FetchError>(page)
            })
            .await
            .map_err(|_| FetchError::GateClosed)?
    }
}
