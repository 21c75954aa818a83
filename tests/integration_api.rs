//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use outage_sim::api::{AppState, router};
use outage_sim::config::ScenarioConfig;
use outage_sim::runner::run_scenario;

/// Runs the early-storm preset with a named roster and returns the API state.
fn build_api_state() -> Arc<AppState> {
    let cfg = ScenarioConfig::early_storm();
    let day = cfg.synthetic_trajectory().expect("preset start parses");
    let names = vec![Some("North Depot".to_string()), None, Some("Harbour".to_string())];
    let run = run_scenario(&cfg, &day, &names).expect("scenario should run");
    Arc::new(AppState::from_run(cfg, &run))
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let resp = app.oneshot(req).await.expect("router should respond");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = serde_json::from_slice(&body).expect("body should be JSON");
    (status, json)
}

#[tokio::test]
async fn state_reports_config_and_summary() {
    let (status, json) = get("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config"]["outage"]["trigger_after_tick"], 6);
    assert_eq!(json["summary"]["tick_count"], 30);
    assert_eq!(json["summary"]["islanded_ticks"], 24);
    assert_eq!(json["latest_tick"]["seq"], 29);
}

#[tokio::test]
async fn telemetry_full_session() {
    let (status, json) = get("/telemetry").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 30);
    assert_eq!(rows[0]["tick_index"], 0);
    assert_eq!(rows[6]["tick_index"], 0);
    assert_eq!(rows[6]["seq"], 6);
}

#[tokio::test]
async fn telemetry_open_ended_range() {
    let (status, json) = get("/telemetry?from=25").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().map(Vec::len), Some(5));

    let (status, json) = get("/telemetry?from=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn telemetry_rejects_reversed_range() {
    let (status, json) = get("/telemetry?from=9&to=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|e| e.contains("from")));
}

#[tokio::test]
async fn stations_use_roster_names() {
    let (status, json) = get("/stations").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["stations"]
        .as_array()
        .map(|s| s.iter().filter_map(|s| s["display_name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["North Depot", "Station 2", "Harbour"]);
    assert!(json["timestamp"].is_string());
}
