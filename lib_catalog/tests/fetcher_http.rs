//! # Fetcher HTTP Tests
//!
//! Drives the blocking `Fetcher` against a local `wiremock` server. The mock
//! server lives on the tokio runtime; every blocking fetch runs on
//! `spawn_blocking` so the blocking `reqwest` client never touches the async
//! context. Sleeps are recorded instead of performed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lib_catalog::catalog::processor::Processor;
use lib_catalog::loggers::{LogLevel, MemoryLogger};
use lib_catalog::retrieve::fetcher::{FetchError, Fetcher};
use lib_catalog::retrieve::http_get::AttemptError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERNAME: &str = "gcd-test";
const PASSWORD: &str = "s3cret";

struct Outcome {
    result: Result<Value, FetchError>,
    slept: Vec<Duration>,
    logger: Arc<MemoryLogger>,
}

/// Runs one fetch on a blocking thread and returns what happened.
async fn fetch_blocking(url: String, max_retries: u32) -> Outcome {
    let logger = Arc::new(MemoryLogger::new("fetcher-test"));
    let slept = Arc::new(Mutex::new(Vec::new()));

    let log = logger.clone();
    let sink = Arc::clone(&slept);
    let result = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::new(USERNAME, PASSWORD, log)?
            .with_sleeper(move |d| sink.lock().unwrap().push(d));
        fetcher.fetch_with_retries(&url, max_retries)
    })
    .await
    .unwrap();

    let slept = slept.lock().unwrap().clone();
    Outcome { result, slept, logger }
}

fn basic_auth_value() -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", USERNAME, PASSWORD)))
}

#[tokio::test]
async fn success_sends_basic_auth_and_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vq"))
        .and(header("authorization", basic_auth_value().as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "value"})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = fetch_blocking(format!("{}/vq", server.uri()), 5).await;

    assert_eq!(outcome.result.unwrap(), json!({"key": "value"}));
    assert!(outcome.slept.is_empty());
    assert!(outcome.logger.records().is_empty());
}

#[tokio::test]
async fn persistent_http_error_makes_exactly_max_retries_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(3)
        .mount(&server)
        .await;

    let url = format!("{}/tq", server.uri());
    let outcome = fetch_blocking(url.clone(), 3).await;

    let err = outcome.result.unwrap_err();
    assert!(err
        .to_string()
        .contains(&format!("Failed to fetch data from endpoint: {}", url)));
    match err {
        FetchError::Exhausted { attempts, last: AttemptError::Status { status, body, .. }, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body.as_deref(), Some("upstream down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(outcome.slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    assert_eq!(outcome.logger.count(LogLevel::Error), 3);
    assert_eq!(
        outcome.logger.messages(LogLevel::Info),
        vec![
            "Retrying... Retry attempt 1 of 3".to_string(),
            "Retrying... Retry attempt 2 of 3".to_string(),
        ]
    );
}

#[tokio::test]
async fn recovers_once_the_endpoint_comes_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let outcome = fetch_blocking(format!("{}/vq", server.uri()), 5).await;

    assert_eq!(outcome.result.unwrap(), json!({"results": []}));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(outcome.slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    assert_eq!(outcome.logger.count(LogLevel::Error), 2);
}

#[tokio::test]
async fn non_json_body_counts_as_a_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let outcome = fetch_blocking(format!("{}/vq", server.uri()), 2).await;

    assert!(matches!(
        outcome.result,
        Err(FetchError::Exhausted { last: AttemptError::Decode(_), .. })
    ));
}

#[tokio::test]
async fn rejected_credentials_are_retried_like_any_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let outcome = fetch_blocking(format!("{}/vq", server.uri()), 2).await;

    match outcome.result {
        Err(FetchError::Exhausted { last: AttemptError::Status { status, .. }, .. }) => {
            assert_eq!(status.as_u16(), 401)
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let outcome = fetch_blocking(format!("{}/vq", uri), 2).await;

    assert!(matches!(
        outcome.result,
        Err(FetchError::Exhausted { last: AttemptError::Transport(_), .. })
    ));
    assert_eq!(outcome.slept, vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn fetched_documents_feed_the_processor() {
    let server = MockServer::start().await;
    let vq: Value = serde_json::from_str(include_str!("fixtures/sample_vq.json")).unwrap();
    let tq: Value = serde_json::from_str(include_str!("fixtures/sample_tq.json")).unwrap();
    Mock::given(method("GET"))
        .and(path("/vq"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vq))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tq"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tq))
        .mount(&server)
        .await;

    let vq = fetch_blocking(format!("{}/vq", server.uri()), 5).await.result.unwrap();
    let tq = fetch_blocking(format!("{}/tq", server.uri()), 5).await.result.unwrap();

    let logger = Arc::new(MemoryLogger::default());
    let noon = chrono::NaiveDate::from_ymd_opt(2024, 6, 19)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let processor = Processor::from_values(vq, tq, logger).unwrap().with_clock(move || noon);

    let titles = processor.get_titles_for_device("ROKU");
    assert_eq!(titles, vec!["Title 1"]);
    assert_eq!(processor.filter_currently_active_items(&titles).len(), 1);
    assert_eq!(processor.get_level3_hd_manifest_paths(), vec!["/path/to/manifest"]);
}
