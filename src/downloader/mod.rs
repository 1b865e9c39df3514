//! Range processing: the day loop, pacing and progress
//!
//! # Overview
//!
//! The range processor turns a `[start_date, end_date)` calendar range into a
//! sequence of one-day windows and handles each one in turn:
//!
//! 1. **Fetch**: one request per window through a [`crate::fetcher::WindowFetcher`]
//! 2. **Append**: non-empty result sets go to the output table via [`crate::output::TableAppender`]
//! 3. **Progress**: `processed/total` days are logged after every window ([`progress`])
//! 4. **Pacing**: a fixed delay separates consecutive requests ([`pacing`])
//!
//! # Quick Start
//!
//! ```no_run
//! use measurement_downloader::downloader::RangeProcessor;
//! use measurement_downloader::fetcher::MeasurementsHttpClient;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = MeasurementsHttpClient::new("https://rald-dev.greenbeep.com")?;
//! let mut processor = RangeProcessor::new(fetcher, "data/raw/measurements.csv");
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//! let report = processor.run(start, end).await;
//! assert_eq!(report.attempts(), 31);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Per-window failures never escape [`RangeProcessor::run`]; they are logged
//! and recorded as [`WindowOutcome::FetchFailed`] or
//! [`WindowOutcome::AppendFailed`] in the returned [`RangeReport`].

pub mod config;
pub mod executor;
pub mod pacing;
pub mod progress;
pub mod report;

pub use executor::RangeProcessor;
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use progress::ProgressCounter;
pub use report::{RangeReport, RunStatus, WindowOutcome, WindowReport};
