mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{entry, init_tracing, memory_store, numbered_entries, seeded_pipeline, StubSource};
use serde_json::Value;
use std::sync::Arc;
use threat_aggregator::server::{create_router, AppState};
use threat_aggregator::{ThreatAggregator, ThreatStore};
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn test_app(entries_per_source: usize) -> (Router, Arc<ThreatStore>) {
    init_tracing();
    let store = memory_store().await;

    let pipeline = seeded_pipeline(store.clone(), 100)
        .with_source(Box::new(StubSource::with_entries(
            "TheHackerNews",
            vec![
                entry(
                    "Critical zero-day RCE exploit in bank VPN",
                    "https://thn.example/vpn",
                    "active attack observed",
                ),
                entry("New CVE in hospital imaging software", "https://thn.example/cve", ""),
            ],
        )))
        .with_source(Box::new(StubSource::with_entries(
            "BleepingComputer",
            numbered_entries("https://bc.example", entries_per_source),
        )))
        .with_source(Box::new(StubSource::failing("ThreatPost", "connection refused")));

    let aggregator = Arc::new(ThreatAggregator::new(store.clone(), pipeline, 50));
    (create_router(AppState { aggregator }), store)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(0).await;
    let (status, body) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_scan_then_data() {
    let (app, _) = test_app(3).await;

    let (status, body) = send(&app, "GET", "/api/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total"], 0);
    assert_eq!(body["stats"]["avg_score"], 0);
    assert_eq!(body["threats"].as_array().unwrap().len(), 0);

    let (status, body) = send(&app, "POST", "/api/scan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 5);

    let (_, body) = send(&app, "POST", "/api/scan").await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(&app, "GET", "/api/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total"], 5);
    assert_eq!(body["stats"]["critical"], 1);
    assert_eq!(body["stats"]["types"]["General"], 4);
    assert_eq!(body["stats"]["types"]["Vulnerability (CVE)"], 1);
    assert!(body["stats"]["types"].get("Ransomware").is_none());

    let threats = body["threats"].as_array().unwrap();
    assert_eq!(threats.len(), 5);

    // Oldest record comes last.
    let headline = &threats[4];
    assert_eq!(headline["source"], "TheHackerNews");
    assert_eq!(headline["link"], "https://thn.example/vpn");
    assert_eq!(headline["threat_type"], "General");
    assert_eq!(headline["severity"], "Critical");
    assert_eq!(headline["target_sector"], "Finance");
    assert_eq!(headline["summary"], "active attack observed");
    assert!(headline["id"].is_i64());
    assert!(headline["published_date"].is_string());

    let cve = &threats[3];
    assert_eq!(cve["threat_type"], "Vulnerability (CVE)");
    assert_eq!(cve["target_sector"], "Healthcare");
}

#[tokio::test]
async fn test_data_is_capped_and_newest_first() {
    let (app, _) = test_app(70).await;

    let (_, body) = send(&app, "POST", "/api/scan").await;
    assert_eq!(body["count"], 72);

    let (_, body) = send(&app, "GET", "/api/data").await;
    assert_eq!(body["stats"]["total"], 72);

    let threats = body["threats"].as_array().unwrap();
    assert_eq!(threats.len(), 50);
    let ids: Vec<i64> = threats.iter().map(|t| t["id"].as_i64().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(threats[0]["link"], "https://bc.example/69");
}

#[tokio::test]
async fn test_store_failure_is_a_server_error() {
    let (app, store) = test_app(1).await;
    store.close().await;

    let (status, body) = send(&app, "POST", "/api/scan").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert!(body["error"].is_string());
}
