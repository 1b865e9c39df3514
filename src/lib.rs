//! # Measurement Downloader Library
//!
//! Retrieves time-windowed measurement records from a remote HTTP API, one
//! calendar day at a time, and appends them to a single growing CSV file.
//!
//! ## Features
//!
//! - **Daily Windows**: every day in `[start_date, end_date)` becomes one `[T00:00, T+1 00:00)` request
//! - **Partial Failure Tolerance**: a failing day is logged and skipped, the rest of the range continues
//! - **Append-Only Output**: the header is written once, every later window adds rows only
//! - **Pacing**: a fixed delay between requests keeps the remote service comfortable
//! - **Graceful Shutdown**: Ctrl+C stops the run between windows with all written rows intact
//!
//! ## Quick Start
//!
//! ```no_run
//! use measurement_downloader::downloader::{config::RunConfig, RangeProcessor};
//! use measurement_downloader::fetcher::http::MeasurementsHttpClient;
//! use measurement_downloader::parse_calendar_date;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::default();
//! let fetcher = MeasurementsHttpClient::new(&config.base_url)?;
//! let mut processor = RangeProcessor::new(fetcher, &config.output_path);
//!
//! let report = processor
//!     .run(parse_calendar_date("2024-01-01")?, parse_calendar_date("2024-01-08")?)
//!     .await;
//! println!("{} of {} days saved", report.saved_days(), report.progress.total_days);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Window fetcher: one HTTP GET per [`TimeWindow`]
//! - [`downloader`] - Range processor: the day loop, progress and pacing
//! - [`output`] - Append-only CSV table writer
//! - [`shutdown`] - Cooperative Ctrl+C handling
//! - [`cli`] - Command line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

/// CLI command implementations
pub mod cli;

/// Range processing, pacing and progress
pub mod downloader;

/// Window fetchers
pub mod fetcher;

/// Output table writers
pub mod output;

/// Graceful shutdown coordination
pub mod shutdown;

/// Timestamp format used for window bounds in API requests (`YYYY-MM-DDTHH:MM`)
pub const WINDOW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Date format accepted for range arguments
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Malformed date argument
#[derive(Debug, thiserror::Error)]
#[error("invalid date '{input}': expected YYYY-MM-DD ({source})")]
pub struct DateParseError {
    /// The rejected input
    pub input: String,
    /// Underlying chrono parse failure
    #[source]
    pub source: chrono::ParseError,
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(input.trim(), CALENDAR_DATE_FORMAT).map_err(|source| {
        DateParseError {
            input: input.to_string(),
            source,
        }
    })
}

/// Half-open time window `[start, end)` queried from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    /// Build a window, truncating both bounds to the minute.
    ///
    /// Returns `None` unless `start < end` after truncation.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        let start = truncate_to_minute(start);
        let end = truncate_to_minute(end);
        (start < end).then_some(Self { start, end })
    }

    /// The `[day 00:00, day+1 00:00)` window
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(chrono::NaiveTime::MIN);
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// Window start (inclusive)
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Window end (exclusive)
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Start bound as sent to the API
    pub fn start_param(&self) -> String {
        self.start.format(WINDOW_TIMESTAMP_FORMAT).to_string()
    }

    /// End bound as sent to the API
    pub fn end_param(&self) -> String {
        self.end.format(WINDOW_TIMESTAMP_FORMAT).to_string()
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start_param(), self.end_param())
    }
}

fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Decoded payload of one successful window fetch.
///
/// The record schema belongs to the API. The payload is only interpreted as
/// "an array of objects" when it is appended to the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    payload: Value,
}

impl ResultSet {
    /// Wrap a decoded JSON payload
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Whether the payload carries no data.
    ///
    /// `null`, `false`, `""`, `[]` and `{}` all count as empty.
    pub fn is_empty(&self) -> bool {
        match &self.payload {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Number(_) => false,
        }
    }

    /// Raw decoded payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consume the set, returning the payload
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

impl From<Value> for ResultSet {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}
