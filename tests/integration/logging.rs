//! Integration tests for logging and tracing

use super::mock_api::{record_for, MockApi};
use chrono::NaiveDate;
use measurement_downloader::downloader::{NoDelay, RangeProcessor};
use measurement_downloader::fetcher::MeasurementsHttpClient;
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Shared in-memory log sink
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capturing_dispatch(logs: &CapturedLogs, json: bool) -> tracing::Dispatch {
    let writer = logs.clone();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("measurement_downloader=debug"))
        .with_writer(move || writer.clone())
        .with_ansi(false);
    if json {
        tracing::Dispatch::new(builder.json().finish())
    } else {
        tracing::Dispatch::new(builder.finish())
    }
}

async fn run_one_day(api: &MockApi, temp_dir: &TempDir, day: NaiveDate) {
    let client = MeasurementsHttpClient::new(api.base_url()).unwrap();
    let mut processor =
        RangeProcessor::new(client, temp_dir.path().join("measurements.csv")).with_pacer(NoDelay);
    processor.run(day, day.succ_opt().unwrap()).await;
}

#[test]
fn test_env_filter_parsing() {
    for directive in [
        "info",
        "measurement_downloader=debug",
        "warn,measurement_downloader=trace",
    ] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
    }
}

#[test]
fn test_filter_suppresses_lower_levels() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        info!("hidden message");
        warn!("visible warning");
        error!("visible error");
    });

    let contents = logs.contents();
    assert!(!contents.contains("hidden message"));
    assert!(contents.contains("visible warning"));
    assert!(contents.contains("visible error"));
}

#[tokio::test]
async fn test_run_logs_progress_and_completion() {
    let logs = CapturedLogs::default();
    let _guard = tracing::dispatcher::set_default(&capturing_dispatch(&logs, false));

    let temp_dir = TempDir::new().unwrap();
    let api = MockApi::always(200, &record_for("2024-01-01")).await;
    run_one_day(&api, &temp_dir, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await;

    let contents = logs.contents();
    assert!(contents.contains("Starting raw data fetching process from 2024-01-01 to 2024-01-02"));
    assert!(contents.contains("Fetching data for 2024-01-01T00:00 to 2024-01-02T00:00..."));
    assert!(contents.contains("Data for 2024-01-01T00:00 saved successfully."));
    assert!(contents.contains("Progress: 1/1 days processed."));
    assert!(contents.contains("Raw data fetching process completed."));
}

#[tokio::test]
async fn test_failed_fetch_is_logged_as_error() {
    let logs = CapturedLogs::default();
    let _guard = tracing::dispatcher::set_default(&capturing_dispatch(&logs, false));

    let temp_dir = TempDir::new().unwrap();
    let api = MockApi::always(503, "unavailable").await;
    run_one_day(&api, &temp_dir, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await;

    let contents = logs.contents();
    assert!(contents.contains("ERROR"));
    assert!(contents.contains("Failed to fetch data for 2024-01-01T00:00 - 2024-01-02T00:00"));
    assert!(contents.contains("HTTP 503"));
    assert!(contents.contains("No data retrieved for 2024-01-01T00:00."));
    assert!(contents.contains("Progress: 1/1 days processed."));
}

#[tokio::test]
async fn test_json_log_lines_parse() {
    let logs = CapturedLogs::default();
    let _guard = tracing::dispatcher::set_default(&capturing_dispatch(&logs, true));

    let temp_dir = TempDir::new().unwrap();
    let api = MockApi::always(200, "[]").await;
    run_one_day(&api, &temp_dir, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await;

    let contents = logs.contents();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(!lines.is_empty());
    assert!(lines
        .iter()
        .any(|line| line["fields"]["message"] == "Progress: 1/1 days processed."));
    assert!(lines.iter().any(|line| line["level"] == "WARN"));
}
