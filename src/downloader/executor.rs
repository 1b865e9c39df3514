//! Range processor: the day-by-day fetch/append loop

use chrono::{Duration, NaiveDate};
use indicatif::ProgressBar;
use std::path::Path;
use tracing::{debug, error, info, warn, Instrument};

use crate::downloader::pacing::{FixedDelay, Pacer};
use crate::downloader::progress::{format_duration, ProgressClock, ProgressCounter};
use crate::downloader::report::{RangeReport, RunStatus, WindowOutcome, WindowReport};
use crate::fetcher::WindowFetcher;
use crate::output::{CsvTableAppender, TableAppender};
use crate::shutdown::SharedShutdown;
use crate::TimeWindow;

/// Drives a [`WindowFetcher`] across consecutive one-day windows and appends
/// every non-empty result set to the output table.
///
/// Windows are processed strictly one after another: fetch, append, report
/// progress, pace. A failing window is logged and skipped; nothing short of a
/// shutdown request stops the run before `end_date`.
pub struct RangeProcessor<F, A = CsvTableAppender> {
    fetcher: F,
    appender: A,
    pacer: Box<dyn Pacer>,
    shutdown: Option<SharedShutdown>,
    progress_bar: Option<ProgressBar>,
    output_label: String,
}

impl<F: WindowFetcher> RangeProcessor<F, CsvTableAppender> {
    /// Create a processor writing to a CSV table at `output_path`, paced at
    /// one request per second
    pub fn new<P: AsRef<Path>>(fetcher: F, output_path: P) -> Self {
        let appender = CsvTableAppender::new(output_path.as_ref());
        Self::with_appender(fetcher, appender)
            .with_output_label(output_path.as_ref().display().to_string())
    }
}

impl<F: WindowFetcher, A: TableAppender> RangeProcessor<F, A> {
    /// Create a processor with an arbitrary table appender
    pub fn with_appender(fetcher: F, appender: A) -> Self {
        Self {
            fetcher,
            appender,
            pacer: Box::new(FixedDelay::default()),
            shutdown: None,
            progress_bar: None,
            output_label: "output table".to_string(),
        }
    }

    /// Override the pacing policy
    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Mirror progress into a progress bar
    pub fn with_progress_bar(mut self, progress_bar: ProgressBar) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    /// Name of the output used in log messages
    pub fn with_output_label(mut self, label: impl Into<String>) -> Self {
        self.output_label = label.into();
        self
    }

    /// Table appender
    pub fn appender(&self) -> &A {
        &self.appender
    }

    /// Fetch and append every day in `[start_date, end_date)`.
    ///
    /// An empty or reversed range performs no fetch and leaves the table
    /// untouched.
    pub async fn run(&mut self, start_date: NaiveDate, end_date: NaiveDate) -> RangeReport {
        let span = tracing::info_span!(
            "range_run",
            start_date = %start_date,
            end_date = %end_date
        );
        self.run_days(start_date, end_date).instrument(span).await
    }

    async fn run_days(&mut self, start_date: NaiveDate, end_date: NaiveDate) -> RangeReport {
        info!(
            pacing_ms = self.pacer.delay().as_millis() as u64,
            "Starting raw data fetching process from {} to {}...",
            start_date, end_date
        );

        let mut progress = ProgressCounter::for_range(start_date, end_date);
        let mut report = RangeReport::new(progress);
        let clock = ProgressClock::start();

        if let Some(pb) = &self.progress_bar {
            pb.set_length(progress.total_days);
            pb.set_position(0);
        }

        let mut current = start_date;
        while current < end_date {
            if self.shutdown_requested() {
                warn!(remaining_from = %current, "Shutdown requested - stopping before next window");
                report.status = RunStatus::Interrupted;
                break;
            }

            let window = TimeWindow::for_day(current);
            let outcome = self.process_window(&window).await;
            report.windows.push(WindowReport { window, outcome });

            progress.tick();
            report.progress = progress;
            info!("{}", progress.format_progress());
            if let Some(remaining) = clock.estimate_remaining(&progress) {
                debug!(
                    percent = progress.percentage().unwrap_or(100.0),
                    eta = %format_duration(remaining),
                    "Estimated time remaining"
                );
            }
            if let Some(pb) = &self.progress_bar {
                pb.set_position(progress.processed_days);
                pb.set_message(window.start_param());
            }

            // A shutdown after the last window still completes the range
            let next = current + Duration::days(1);
            if !self.pace().await && next < end_date {
                report.status = RunStatus::Interrupted;
                warn!("Shutdown requested during pacing - stopping");
                break;
            }

            current = next;
        }

        match report.status {
            RunStatus::Completed => info!(
                saved_days = report.saved_days(),
                failed_days = report.failed_days(),
                rows = report.rows_written(),
                "Raw data fetching process completed. Data saved to {}",
                self.output_label
            ),
            RunStatus::Interrupted => warn!(
                saved_days = report.saved_days(),
                rows = report.rows_written(),
                "Raw data fetching process interrupted after {} days. Data saved to {}",
                progress.processed_days,
                self.output_label
            ),
        }

        report
    }

    /// Fetch one window and append its rows. Never fails: every error is
    /// logged and folded into the outcome.
    async fn process_window(&mut self, window: &TimeWindow) -> WindowOutcome {
        let label = window.start_param();
        info!("Fetching data for {} to {}...", label, window.end_param());

        let result_set = match self.fetcher.fetch(window).await {
            Ok(result_set) => result_set,
            Err(e) => {
                error!(error = %e, "Failed to fetch data for {}", window);
                warn!("No data retrieved for {}.", label);
                return WindowOutcome::FetchFailed(e.to_string());
            }
        };

        if result_set.is_empty() {
            warn!("No data retrieved for {}.", label);
            return WindowOutcome::NoData;
        }

        match self.appender.append(result_set) {
            Ok(rows) => {
                info!(rows = rows, "Data for {} saved successfully.", label);
                WindowOutcome::Saved { rows }
            }
            Err(e) => {
                error!(error = %e, "Error saving data for {}", label);
                WindowOutcome::AppendFailed(e.to_string())
            }
        }
    }

    /// Wait out the pacing delay. Returns `false` if shutdown was requested
    /// meanwhile.
    async fn pace(&self) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = self.pacer.pause() => !shutdown.is_shutdown_requested(),
                    _ = shutdown.wait_for_shutdown() => false,
                }
            }
            None => {
                self.pacer.pause().await;
                true
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }
}
