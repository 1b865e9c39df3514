//! HTTP window fetcher for the measurements API
//!
//! One GET per window against `{base_url}/api/v1/measurements` with `start`
//! and `end` query parameters. No retries: a failed window is reported to the
//! caller, which decides what to do with it.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::downloader::config::{MEASUREMENTS_ENDPOINT, REQUEST_TIMEOUT};
use crate::fetcher::{FetcherError, FetcherResult, WindowFetcher};
use crate::{ResultSet, TimeWindow};

/// Longest error body kept in [`FetcherError::HttpStatus`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// HTTP client for the measurements endpoint
pub struct MeasurementsHttpClient {
    client: Arc<Client>,
    base_url: String,
    timeout: Duration,
}

impl MeasurementsHttpClient {
    /// Create a client with the default 60 second timeout
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://rald-dev.greenbeep.com`
    pub fn new(base_url: impl Into<String>) -> FetcherResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;

        Ok(Self::from_client(Arc::new(client), base_url, timeout))
    }

    /// Wrap an existing client. `timeout` is only used for error reporting;
    /// the client is expected to enforce it.
    pub fn from_client(client: Arc<Client>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full endpoint URL
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, MEASUREMENTS_ENDPOINT)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> FetcherError {
        if e.is_timeout() {
            FetcherError::Timeout(self.timeout)
        } else {
            FetcherError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl WindowFetcher for MeasurementsHttpClient {
    async fn fetch(&self, window: &TimeWindow) -> FetcherResult<ResultSet> {
        let url = self.endpoint_url();
        let params = [("start", window.start_param()), ("end", window.end_param())];

        debug!(url = %url, start = %params[0].1, end = %params[1].1, "Making GET request");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetcherError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            FetcherError::DecodeError(format!("Failed to deserialize response: {e}"))
        })?;

        debug!(bytes = body.len(), "Request succeeded");
        Ok(ResultSet::new(payload))
    }
}
