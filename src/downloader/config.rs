//! Download configuration constants and environment-driven run settings

use std::path::PathBuf;
use std::time::Duration;

/// Measurements endpoint path, appended to the base URL
pub const MEASUREMENTS_ENDPOINT: &str = "/api/v1/measurements";

/// Timeout for one window request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between consecutive window requests.
pub const PACING_DELAY: Duration = Duration::from_secs(1);

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://rald-dev.greenbeep.com";

/// Default output table path
pub const DEFAULT_OUTPUT_PATH: &str = "data/raw/airelibre_data.csv";

/// Default log file path
pub const DEFAULT_LOG_FILE: &str = "fetch_raw_data.log";

/// Environment variable overriding the API root
pub const ENV_BASE_URL: &str = "MEASUREMENTS_BASE_URL";

/// Environment variable overriding the output table path
pub const ENV_OUTPUT_PATH: &str = "MEASUREMENTS_OUTPUT";

/// Environment variable overriding the log file path
pub const ENV_LOG_FILE: &str = "MEASUREMENTS_LOG_FILE";

/// Environment variable overriding the pacing delay, in milliseconds
pub const ENV_PACING_MS: &str = "MEASUREMENTS_PACING_MS";

/// Invalid environment configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Variable present but not parseable
    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Settings for one run, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// API root, e.g. `https://rald-dev.greenbeep.com`
    pub base_url: String,
    /// CSV file receiving all rows
    pub output_path: PathBuf,
    /// Append-only log file
    pub log_file: PathBuf,
    /// Delay between windows
    pub pacing: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            pacing: PACING_DELAY,
        }
    }
}

impl RunConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup, falling back to defaults.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(output) = get(ENV_OUTPUT_PATH) {
            config.output_path = PathBuf::from(output);
        }
        if let Some(log_file) = get(ENV_LOG_FILE) {
            config.log_file = PathBuf::from(log_file);
        }
        if let Some(raw) = get(ENV_PACING_MS) {
            let millis: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: ENV_PACING_MS,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.pacing = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
