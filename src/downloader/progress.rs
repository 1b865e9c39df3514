//! Day-level progress tracking for a range run.
//!
//! Progress is observability only: a `(processed_days, total_days)` pair that
//! is logged after every window and mirrored into an optional progress bar.

use chrono::NaiveDate;
use std::time::{Duration, Instant};

/// Progress of a range run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounter {
    /// Windows handled so far, whatever their outcome
    pub processed_days: u64,
    /// Whole days between start and end date, zero for empty or reversed ranges
    pub total_days: u64,
}

impl ProgressCounter {
    /// Counter for the `[start_date, end_date)` range
    pub fn for_range(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let span = (end_date - start_date).num_days();
        Self {
            processed_days: 0,
            total_days: u64::try_from(span).unwrap_or(0),
        }
    }

    /// Record one processed window
    pub fn tick(&mut self) {
        self.processed_days = self.processed_days.saturating_add(1);
    }

    /// Completion percentage (0-100), `None` when there is nothing to do
    pub fn percentage(&self) -> Option<f64> {
        if self.total_days == 0 {
            return None;
        }
        Some((self.processed_days as f64 / self.total_days as f64) * 100.0)
    }

    /// Progress line as written to the log
    pub fn format_progress(&self) -> String {
        format!(
            "Progress: {}/{} days processed.",
            self.processed_days, self.total_days
        )
    }
}

impl std::fmt::Display for ProgressCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.processed_days, self.total_days)
    }
}

/// Wall-clock estimate of the remaining run time
#[derive(Debug, Clone)]
pub struct ProgressClock {
    started: Instant,
}

impl ProgressClock {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining time extrapolated from the average per-day duration
    pub fn estimate_remaining(&self, progress: &ProgressCounter) -> Option<Duration> {
        if progress.processed_days == 0 || progress.processed_days >= progress.total_days {
            return None;
        }
        let per_day = self.elapsed().as_secs_f64() / progress.processed_days as f64;
        let remaining = (progress.total_days - progress.processed_days) as f64;
        Some(Duration::from_secs_f64(per_day * remaining))
    }
}

/// Compact human duration ("42s", "7m", "1.5h")
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
