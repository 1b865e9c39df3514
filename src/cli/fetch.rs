//! Fetch command: parse the date range and run the day loop

use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::CliError;
use crate::downloader::config::RunConfig;
use crate::downloader::{FixedDelay, RangeProcessor, RangeReport, RunStatus, WindowOutcome};
use crate::fetcher::{MeasurementsHttpClient, WindowFetcher};
use crate::parse_calendar_date;
use crate::shutdown::SharedShutdown;

/// Measurement Downloader CLI
///
/// Fetches one day of measurements at a time for `[start-date, end-date)` and
/// appends them to a CSV file. Base URL, output path, log file and pacing are
/// read from the `MEASUREMENTS_*` environment variables.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "measurement-downloader")]
#[command(about = "Fetch raw measurement data day by day and save it to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Start date in YYYY-MM-DD format (inclusive)
    #[arg(long, alias = "start_date")]
    pub start_date: String,

    /// End date in YYYY-MM-DD format (exclusive)
    #[arg(long, alias = "end_date")]
    pub end_date: String,
}

impl Cli {
    /// Parse both dates. Fails before any side effect on malformed input.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), CliError> {
        let start = parse_calendar_date(&self.start_date)?;
        let end = parse_calendar_date(&self.end_date)?;
        Ok((start, end))
    }

    /// Run the fetch against the configured HTTP API
    pub async fn execute(
        &self,
        config: &RunConfig,
        shutdown: SharedShutdown,
    ) -> Result<RangeReport, CliError> {
        let (start, end) = self.date_range()?;
        let fetcher = MeasurementsHttpClient::new(&config.base_url)?;

        info!(
            base_url = %config.base_url,
            output = %config.output_path.display(),
            pacing_ms = config.pacing.as_millis() as u64,
            "Configuration loaded"
        );

        let progress = create_progress_bar();
        let report = run_range(fetcher, config, start, end, shutdown, progress.clone()).await;
        progress.finish_and_clear();

        output_human(config, &report);
        Ok(report)
    }
}

/// Run the day loop with an arbitrary fetcher, writing to `config.output_path`
pub async fn run_range<F: WindowFetcher>(
    fetcher: F,
    config: &RunConfig,
    start: NaiveDate,
    end: NaiveDate,
    shutdown: SharedShutdown,
    progress: ProgressBar,
) -> RangeReport {
    let mut processor = RangeProcessor::new(fetcher, &config.output_path)
        .with_pacer(FixedDelay::new(config.pacing))
        .with_shutdown(shutdown)
        .with_progress_bar(progress);

    processor.run(start, end).await
}

/// Output result in human-readable format
fn output_human(config: &RunConfig, report: &RangeReport) {
    match report.status {
        RunStatus::Completed => println!("\nFetch completed."),
        RunStatus::Interrupted => println!("\nFetch interrupted."),
    }
    println!("Output: {}", config.output_path.display());
    println!(
        "Days processed: {}/{}",
        report.progress.processed_days, report.progress.total_days
    );
    println!("Days saved: {}", report.saved_days());
    println!("Rows written: {}", report.rows_written());

    let failures: Vec<_> = report
        .windows
        .iter()
        .filter_map(|w| match &w.outcome {
            WindowOutcome::FetchFailed(reason) | WindowOutcome::AppendFailed(reason) => {
                Some((w.window.start_param(), reason))
            }
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!("Failed days: {}", failures.len());
        for (day, reason) in failures {
            println!("  {day}: {reason}");
        }
    }
}

/// Create progress bar with style
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} days {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
