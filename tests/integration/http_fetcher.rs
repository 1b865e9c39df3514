//! Integration tests for the measurements HTTP client

use super::mock_api::{record_for, MockApi};
use chrono::NaiveDate;
use measurement_downloader::fetcher::{FetcherError, MeasurementsHttpClient, WindowFetcher};
use measurement_downloader::TimeWindow;
use std::time::Duration;

fn first_of_january() -> TimeWindow {
    TimeWindow::for_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
}

#[tokio::test]
async fn test_fetch_sends_window_bounds_as_query() {
    let api = MockApi::always(200, &record_for("2024-01-01")).await;
    let client = MeasurementsHttpClient::new(api.base_url()).unwrap();

    let result = client.fetch(&first_of_january()).await.unwrap();
    assert_eq!(result.payload().as_array().map(Vec::len), Some(1));

    let requests = api.requests();
    assert_eq!(requests.len(), 1, "exactly one request per window");
    assert_eq!(
        requests[0],
        "/api/v1/measurements?start=2024-01-01T00%3A00&end=2024-01-02T00%3A00"
    );
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let api = MockApi::always(200, "[]").await;
    let client = MeasurementsHttpClient::new(format!("{}/", api.base_url())).unwrap();

    let result = client.fetch(&first_of_january()).await.unwrap();
    assert!(result.is_empty());
    assert!(api.requests()[0].starts_with("/api/v1/measurements?"));
}

#[tokio::test]
async fn test_server_error_maps_to_http_status() {
    let api = MockApi::always(500, r#"{"detail":"internal"}"#).await;
    let client = MeasurementsHttpClient::new(api.base_url()).unwrap();

    match client.fetch(&first_of_january()).await {
        Err(FetcherError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("internal"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert_eq!(api.requests().len(), 1, "failures are not retried");
}

#[tokio::test]
async fn test_not_found_maps_to_http_status() {
    let api = MockApi::always(404, "{}").await;
    let client = MeasurementsHttpClient::new(api.base_url()).unwrap();

    let err = client.fetch(&first_of_january()).await.unwrap_err();
    assert!(matches!(err, FetcherError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_invalid_json_maps_to_decode_error() {
    let api = MockApi::always(200, "<html>maintenance</html>").await;
    let client = MeasurementsHttpClient::new(api.base_url()).unwrap();

    let err = client.fetch(&first_of_january()).await.unwrap_err();
    assert!(matches!(err, FetcherError::DecodeError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_maps_to_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MeasurementsHttpClient::new(format!("http://{addr}")).unwrap();
    let err = client.fetch(&first_of_january()).await.unwrap_err();
    assert!(matches!(err, FetcherError::NetworkError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unresponsive_server_maps_to_timeout() {
    // Accepts connections but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let timeout = Duration::from_millis(200);
    let client = MeasurementsHttpClient::with_timeout(format!("http://{addr}"), timeout).unwrap();

    match client.fetch(&first_of_january()).await {
        Err(FetcherError::Timeout(elapsed)) => assert_eq!(elapsed, timeout),
        other => panic!("expected Timeout, got {other:?}"),
    }
}
