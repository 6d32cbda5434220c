//! Fetch client for the remote advice endpoint.
//!
//! DESIGN
//! ======
//! One GET per call, no retries. The endpoint answers with an envelope of
//! the form `{"slip": {"id": 117, "advice": "..."}}`; only the nested slip
//! is kept. The controller depends on [`AdviceSource`] rather than on the
//! HTTP client so tests can script fetch results.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde::Deserialize;

use crate::advice::AdviceRecord;
use crate::config::HttpTimeouts;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while fetching advice.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request could not be sent or the body could not be read.
    #[error("advice request failed: {0}")]
    Request(String),

    /// The endpoint returned a non-success HTTP status.
    #[error("advice endpoint returned status {status}")]
    Status { status: u16, body: String },

    /// The body did not contain a well-formed advice slip.
    #[error("advice response parse failed: {0}")]
    Parse(String),
}

// =============================================================================
// SOURCE TRAIT
// =============================================================================

/// Anything that can produce the next advice record.
#[async_trait::async_trait]
pub trait AdviceSource: Send + Sync {
    /// Fetch one advice record.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the advice could not be obtained.
    async fn fetch_advice(&self) -> Result<AdviceRecord, FetchError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAdviceClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpAdviceClient {
    /// Build a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(endpoint: Url, timeouts: HttpTimeouts) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| FetchError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait::async_trait]
impl AdviceSource for HttpAdviceClient {
    async fn fetch_advice(&self) -> Result<AdviceRecord, FetchError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: text });
        }

        let record = parse_slip(&text)?;
        tracing::debug!(id = record.id, "fetched advice");
        Ok(record)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct SlipEnvelope {
    slip: AdviceRecord,
}

/// Extract the advice record from a response body.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the body is not a slip envelope.
pub fn parse_slip(body: &str) -> Result<AdviceRecord, FetchError> {
    serde_json::from_str::<SlipEnvelope>(body)
        .map(|envelope| envelope.slip)
        .map_err(|e| FetchError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
