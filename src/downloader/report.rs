//! Per-window outcomes and the run report

use super::progress::ProgressCounter;
use crate::TimeWindow;

/// What happened to one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowOutcome {
    /// Rows were appended to the output table
    Saved {
        /// Number of rows written
        rows: usize,
    },
    /// Fetch succeeded but carried no data; nothing written
    NoData,
    /// Fetch failed; nothing written
    FetchFailed(String),
    /// Fetch succeeded but the rows could not be written
    AppendFailed(String),
}

impl WindowOutcome {
    /// Whether rows were written
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Rows written for this window
    pub fn rows(&self) -> usize {
        match self {
            Self::Saved { rows } => *rows,
            _ => 0,
        }
    }
}

/// Outcome of one window, with the window it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowReport {
    /// Queried window
    pub window: TimeWindow,
    /// What happened
    pub outcome: WindowOutcome,
}

/// Run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Every window of the range was attempted
    #[default]
    Completed,
    /// Stopped early on a shutdown request
    Interrupted,
}

/// Result of a range run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReport {
    /// Outcomes in window order
    pub windows: Vec<WindowReport>,
    /// Final progress
    pub progress: ProgressCounter,
    /// Whether the run covered the whole range
    pub status: RunStatus,
}

impl RangeReport {
    /// Empty report for a range
    pub fn new(progress: ProgressCounter) -> Self {
        Self {
            windows: Vec::new(),
            progress,
            status: RunStatus::Completed,
        }
    }

    /// Number of fetch attempts made
    pub fn attempts(&self) -> usize {
        self.windows.len()
    }

    /// Windows whose rows were written
    pub fn saved_days(&self) -> usize {
        self.windows.iter().filter(|w| w.outcome.is_saved()).count()
    }

    /// Total rows written during the run
    pub fn rows_written(&self) -> usize {
        self.windows.iter().map(|w| w.outcome.rows()).sum()
    }

    /// Windows that failed to fetch or append
    pub fn failed_days(&self) -> usize {
        self.windows
            .iter()
            .filter(|w| {
                matches!(
                    w.outcome,
                    WindowOutcome::FetchFailed(_) | WindowOutcome::AppendFailed(_)
                )
            })
            .count()
    }
}
