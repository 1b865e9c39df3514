//! CLI error types and conversions

use crate::downloader::config::ConfigError;
use crate::fetcher::FetcherError;
use crate::DateParseError;

/// Fatal errors surfaced by the command layer
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Malformed start or end date
    #[error("date error: {0}")]
    DateError(#[from] DateParseError),

    /// Invalid environment configuration
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// HTTP client could not be set up
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),
}
