//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the directory search API and
//! exercise fetching, pagination, the admission gate and file output.

use serde_json::{json, Value};
use staff_harvest::config::{Config, FetcherConfig, OutputConfig, PaginationPolicy};
use staff_harvest::crawler::{
    build_http_client, run_harvest, AdmissionGate, FetchError, FetchOutcome, Harvester,
    PageFetcher,
};
use staff_harvest::model::{EmployeeRow, PageRequest, HEADERS};
use staff_harvest::url::SearchUrl;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, terms: &[&str]) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/sok", base_url);
    config.fetcher = FetcherConfig {
        timeout_secs: 5,
        max_attempts: 3,
        initial_backoff_ms: 10,
        max_concurrent_requests: 10,
        default_page_size: 10,
    };
    config.scrape.terms = terms.iter().map(|t| t.to_string()).collect();
    config.scrape.page_delay_ms = 0;
    config
}

fn create_fetcher(config: &Config) -> PageFetcher {
    PageFetcher::new(
        build_http_client(config).expect("Failed to build client"),
        SearchUrl::new(&config.api).expect("Failed to parse base URL"),
        AdmissionGate::new(config.fetcher.max_concurrent_requests as usize),
        &config.fetcher,
    )
}

/// `count` employee documents whose emails start with `prefix`
fn docs(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "title": format!("{} Person {:02}", prefix.to_uppercase(), i),
                "email": format!("{}{}@ntnu.no", prefix, i),
                "roleTitle": "Researcher",
                "url": format!("https://www.ntnu.edu/employees/{}{}", prefix, i),
            })
        })
        .collect()
}

fn page_body(num_found: u64, page_size: u64, docs: Vec<Value>) -> Value {
    json!({ "numFound": num_found, "pageSize": page_size, "docs": docs })
}

/// Mounts a JSON response for one (term, page) pair
async fn mount_page(server: &MockServer, term: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", term))
        .and(query_param("pageNr", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_sends_browser_headers_and_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("category", "employee"))
        .and(query_param("sort", "alpha"))
        .and(query_param("query", "a"))
        .and(query_param("pageNr", "1"))
        .and(header("accept", "application/json"))
        .and(header_regex("user-agent", "^Mozilla/5\\.0 "))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 10, docs("a", 1))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["a"]);
    let outcome = create_fetcher(&config)
        .fetch(&PageRequest::new("a", 1), &CancellationToken::new())
        .await;

    let page = outcome.into_page().expect("Expected a page");
    assert_eq!(page.num_found, Some(1));
    assert_eq!(page.docs.len(), 1);
}

#[tokio::test]
async fn test_retry_succeeds_on_third_attempt() {
    let mock_server = MockServer::start().await;

    // First two attempts fail
    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 10, docs("b", 3))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["b"]);
    let outcome = create_fetcher(&config)
        .fetch(&PageRequest::new("b", 1), &CancellationToken::new())
        .await;

    let page = outcome.into_page().expect("Third attempt should succeed");
    assert_eq!(page.docs.len(), 3);
}

#[tokio::test]
async fn test_retry_exhausted_returns_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["c"]);
    let fetcher = create_fetcher(&config);
    let outcome = fetcher
        .fetch(&PageRequest::new("c", 1), &CancellationToken::new())
        .await;

    assert_eq!(
        outcome,
        FetchOutcome::Failed {
            attempts: 3,
            last_error: FetchError::Status(500),
        }
    );
    assert_eq!(fetcher.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_backoff_doubles_between_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &["d"]);
    config.fetcher.initial_backoff_ms = 100;

    let started = Instant::now();
    let outcome = create_fetcher(&config)
        .fetch(&PageRequest::new("d", 1), &CancellationToken::new())
        .await;

    // 100ms after the first failure, 200ms after the second, none after the last
    assert!(outcome.is_failed());
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_backoff_sleep_does_not_hold_gate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", "bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "ok", 1, page_body(1, 10, docs("ok", 1))).await;

    let mut config = create_test_config(&mock_server.uri(), &["bad", "ok"]);
    config.fetcher.max_concurrent_requests = 1;
    config.fetcher.initial_backoff_ms = 2000;
    let fetcher = create_fetcher(&config);

    let cancel = CancellationToken::new();
    let failing = {
        let fetcher = fetcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { fetcher.fetch(&PageRequest::new("bad", 1), &cancel).await })
    };

    // Let the first attempt fail so the fetch is sleeping in backoff
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fetcher.gate().in_flight(), 0);

    let started = Instant::now();
    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        fetcher.fetch(&PageRequest::new("ok", 1), &CancellationToken::new()),
    )
    .await
    .expect("Fetch should not wait for the backoff of another fetch");

    assert_eq!(outcome.into_page().expect("Expected a page").docs.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));

    cancel.cancel();
    let failing = failing.await.expect("Fetch task panicked");
    assert_eq!(failing, FetchOutcome::Cancelled);
    assert_eq!(fetcher.gate().ceiling(), 1);
}

#[tokio::test]
async fn test_json_parsed_regardless_of_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_body(2, 10, docs("e", 2)).to_string())
                .insert_header("content-type", "text/html;charset=UTF-8"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["e"]);
    let outcome = create_fetcher(&config)
        .fetch(&PageRequest::new("e", 1), &CancellationToken::new())
        .await;

    assert_eq!(outcome.into_page().map(|p| p.docs.len()), Some(2));
}

#[tokio::test]
async fn test_invalid_json_is_retried_then_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["f"]);
    let outcome = create_fetcher(&config)
        .fetch(&PageRequest::new("f", 1), &CancellationToken::new())
        .await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failed {
            attempts: 3,
            last_error: FetchError::InvalidJson(_),
        }
    ));
}

#[tokio::test]
async fn test_term_with_three_pages() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "a", 1, page_body(25, 10, docs("a1-", 10))).await;
    mount_page(&mock_server, "a", 2, page_body(25, 10, docs("a2-", 10))).await;
    mount_page(&mock_server, "a", 3, page_body(25, 10, docs("a3-", 5))).await;

    let config = create_test_config(&mock_server.uri(), &["a"]);
    let harvester = Harvester::new(&config).expect("Failed to create harvester");
    let report = harvester.run(&CancellationToken::new()).await;

    assert_eq!(report.terms.len(), 1);
    let term = &report.terms[0];
    assert_eq!(term.term, "a");
    assert_eq!(term.total_pages, 3);
    assert_eq!(term.pages_fetched, 3);
    assert_eq!(term.pages_failed, 0);
    assert_eq!(term.rows.len(), 25);
    assert!(!report.cancelled);
    assert!(term.rows.iter().all(|r| r.university == "NTNU"));
}

#[tokio::test]
async fn test_failed_page_contributes_zero_rows() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "g", 1, page_body(30, 10, docs("g1-", 10))).await;
    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", "g"))
        .and(query_param("pageNr", "2"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "g", 3, page_body(30, 10, docs("g3-", 10))).await;

    let config = create_test_config(&mock_server.uri(), &["g"]);
    let harvester = Harvester::new(&config).expect("Failed to create harvester");
    let report = harvester.run(&CancellationToken::new()).await;

    let term = &report.terms[0];
    assert_eq!(term.total_pages, 3);
    assert_eq!(term.pages_failed, 1);
    assert_eq!(term.rows.len(), 20);
}

#[tokio::test]
async fn test_failed_first_page_skips_only_that_term() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", "h"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "i", 1, page_body(4, 10, docs("i", 4))).await;

    let config = create_test_config(&mock_server.uri(), &["h", "i"]);
    let harvester = Harvester::new(&config).expect("Failed to create harvester");
    let report = harvester.run(&CancellationToken::new()).await;

    assert_eq!(report.terms[0].term, "h");
    assert_eq!(report.terms[0].total_pages, 0);
    assert!(report.terms[0].rows.is_empty());
    assert_eq!(report.terms[1].rows.len(), 4);
    assert_eq!(report.skipped_terms(), vec!["h"]);
}

#[tokio::test]
async fn test_concurrent_policy_reads_past_empty_page() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "j", 1, page_body(40, 10, docs("j1-", 10))).await;
    mount_page(&mock_server, "j", 2, page_body(40, 10, Vec::new())).await;
    mount_page(&mock_server, "j", 3, page_body(40, 10, docs("j3-", 10))).await;
    mount_page(&mock_server, "j", 4, page_body(40, 10, docs("j4-", 10))).await;

    let config = create_test_config(&mock_server.uri(), &["j"]);
    let report = Harvester::new(&config)
        .expect("Failed to create harvester")
        .run(&CancellationToken::new())
        .await;

    assert_eq!(report.terms[0].total_pages, 4);
    assert_eq!(report.terms[0].rows.len(), 30);
}

#[tokio::test]
async fn test_sequential_policy_stops_at_empty_page() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "k", 1, page_body(50, 10, docs("k1-", 10))).await;
    mount_page(&mock_server, "k", 2, page_body(50, 10, docs("k2-", 10))).await;
    mount_page(&mock_server, "k", 3, page_body(50, 10, Vec::new())).await;

    // Never requested once page 3 comes back empty
    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", "k"))
        .and(query_param("pageNr", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, 10, docs("k4-", 10))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &["k"]);
    config.scrape.pagination = PaginationPolicy::Sequential;

    let report = Harvester::new(&config)
        .expect("Failed to create harvester")
        .run(&CancellationToken::new())
        .await;

    assert_eq!(report.terms[0].total_pages, 5);
    assert_eq!(report.terms[0].pages_fetched, 3);
    assert_eq!(report.terms[0].rows.len(), 20);
}

#[tokio::test]
async fn test_concurrency_ceiling_across_terms() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(30, 10, docs("x", 10)))
                .set_delay(Duration::from_millis(80)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &["l", "m", "n"]);
    config.fetcher.max_concurrent_requests = 2;

    let harvester = Harvester::new(&config).expect("Failed to create harvester");
    let report = harvester.run(&CancellationToken::new()).await;

    // 3 terms x 3 pages
    assert_eq!(report.total_pages(), 9);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 9);
    // One gate for every term, and it fills up
    assert_eq!(harvester.gate().peak(), 2);
    assert_eq!(harvester.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_run_deadline_keeps_partial_rows() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "o", 1, page_body(20, 10, docs("o1-", 10))).await;
    Mock::given(method("GET"))
        .and(path("/sok"))
        .and(query_param("query", "o"))
        .and(query_param("pageNr", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(20, 10, docs("o2-", 10)))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &["o"]);
    config.scrape.run_timeout_secs = Some(1);

    let started = Instant::now();
    let report = Harvester::new(&config)
        .expect("Failed to create harvester")
        .run(&CancellationToken::new())
        .await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(report.cancelled);
    assert_eq!(report.terms[0].rows.len(), 10);
}

#[tokio::test]
async fn test_external_cancel_stops_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(10, 10, docs("p", 10)))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["p", "q"]);
    let harvester = Harvester::new(&config).expect("Failed to create harvester");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let report = harvester.run(&cancel).await;
    assert!(report.cancelled);
    assert_eq!(report.raw_rows(), 0);
    assert!(report.terms.iter().all(|t| t.cancelled));

    // A cancelled run closes the shared gate
    assert!(harvester.gate().admit(async {}).await.is_err());
    assert_eq!(harvester.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_huge_page_count_is_fetched_lazily() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "s", 1, page_body(4_000_000_000, 1, docs("s", 1))).await;
    Mock::given(method("GET"))
        .and(path("/sok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(4_000_000_000, 1, docs("s", 1)))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["s"]);
    let harvester = Harvester::new(&config).expect("Failed to create harvester");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), harvester.run(&cancel))
        .await
        .expect("Run should stop soon after cancellation");

    let term = &report.terms[0];
    assert!(report.cancelled);
    assert_eq!(term.total_pages, 4_000_000_000);
    assert!(term.pages_fetched >= 1);
    assert!(term.pages_fetched < 1_000);
    assert!(mock_server.received_requests().await.unwrap().len() < 1_000);
}

#[tokio::test]
async fn test_full_harvest_deduplicates_and_writes_files() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    // "r" and "s" both find Ann (different email case) and the same no-email person
    mount_page(
        &mock_server,
        "r",
        1,
        json!({
            "numFound": 3,
            "pageSize": 10,
            "docs": [
                { "title": "Ann Berg", "email": "Ann.Berg@NTNU.no", "url": "https://p/ann" },
                { "displayName": "Guest Lecturer", "url": "https://p/guest " },
                { "title": "Zoe Dahl", "email": "zoe@ntnu.no", "roleTitle": "Professor" },
            ]
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "s",
        1,
        json!({
            "numFound": 2,
            "pageSize": 10,
            "docs": [
                { "title": "Ann Berg", "email": " ann.berg@ntnu.no", "url": "https://p/ann2" },
                { "title": "Guest Lecturer", "url": "https://p/guest" },
            ]
        }),
    )
    .await;

    let mut config = create_test_config(&mock_server.uri(), &["r", "s"]);
    config.output = OutputConfig {
        csv_path: dir.path().join("employees.csv").display().to_string(),
        xlsx_path: dir.path().join("employees.xlsx").display().to_string(),
    };

    let summary = run_harvest(&config, &CancellationToken::new())
        .await
        .expect("Harvest failed");

    assert_eq!(summary.terms, 2);
    assert_eq!(summary.raw_rows, 5);
    assert_eq!(summary.unique_rows, 3);
    assert_eq!(summary.outputs.len(), 2);

    let bytes = std::fs::read(dir.path().join("employees.csv")).expect("CSV missing");
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let mut reader = csv::Reader::from_reader(&bytes[3..]);
    let rows: Vec<EmployeeRow> = reader
        .deserialize()
        .map(|r| r.expect("Bad CSV row"))
        .collect();

    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Ann Berg", "Guest Lecturer", "Zoe Dahl"]);
    assert_eq!(rows[0].email, "ann.berg@ntnu.no");
    assert_eq!(rows[0].profile_url, "https://p/ann");
    assert_eq!(rows[1].profile_url, "https://p/guest");
    assert_eq!(rows[2].position, "Professor");

    assert!(dir.path().join("employees.xlsx").exists());
}

#[tokio::test]
async fn test_empty_results_still_write_headers() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    mount_page(&mock_server, "t", 1, json!({ "numFound": 0, "docs": [] })).await;

    let mut config = create_test_config(&mock_server.uri(), &["t"]);
    config.output = OutputConfig {
        csv_path: dir.path().join("empty.csv").display().to_string(),
        xlsx_path: dir.path().join("empty.xlsx").display().to_string(),
    };

    let summary = run_harvest(&config, &CancellationToken::new())
        .await
        .expect("Harvest failed");
    assert_eq!(summary.unique_rows, 0);

    let bytes = std::fs::read(dir.path().join("empty.csv")).expect("CSV missing");
    let mut reader = csv::Reader::from_reader(&bytes[3..]);
    let headers = reader.headers().expect("Missing headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), HEADERS.to_vec());
    assert_eq!(reader.records().count(), 0);
    assert!(dir.path().join("empty.xlsx").exists());
}
