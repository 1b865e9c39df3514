//! Window fetcher implementations

use crate::{ResultSet, TimeWindow};
use async_trait::async_trait;

pub mod http;

pub use http::MeasurementsHttpClient;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Transport failure (DNS, connection refused, reset, ...)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Response body is not valid JSON
    #[error("decode error: {0}")]
    DecodeError(String),

    /// HTTP client could not be built
    #[error("client error: {0}")]
    ClientError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Fetches the records of a single time window.
///
/// Implementations make exactly one attempt per call and have no side
/// effects beyond the request itself.
#[async_trait]
pub trait WindowFetcher: Send + Sync {
    /// Fetch all records in `[window.start, window.end)`
    async fn fetch(&self, window: &TimeWindow) -> FetcherResult<ResultSet>;
}

#[async_trait]
impl<F: WindowFetcher + ?Sized> WindowFetcher for Box<F> {
    async fn fetch(&self, window: &TimeWindow) -> FetcherResult<ResultSet> {
        (**self).fetch(window).await
    }
}

#[async_trait]
impl<F: WindowFetcher + ?Sized> WindowFetcher for std::sync::Arc<F> {
    async fn fetch(&self, window: &TimeWindow) -> FetcherResult<ResultSet> {
        (**self).fetch(window).await
    }
}
