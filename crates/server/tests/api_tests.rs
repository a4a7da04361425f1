//! Integration tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use scalewatch_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use telemetry_lib::{
    health::{components, HealthRegistry},
    models::ResourceSample,
    ServiceMetrics, StressController, TelemetryAggregator,
};
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::AGGREGATOR).await;
    health_registry.register(components::SAMPLER).await;
    health_registry.register(components::STRESS).await;
    health_registry.set_ready(true).await;

    let metrics = ServiceMetrics::new();
    let aggregator = Arc::new(TelemetryAggregator::new());
    let stress = Arc::new(StressController::new(metrics.clone()));

    let state = Arc::new(AppState::new(
        aggregator,
        stress,
        health_registry,
        metrics,
        "test-pod",
        "test-node",
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn healthz_reports_registered_components() {
    let (app, _state) = setup_test_app().await;

    let (status, health) = get(&app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["aggregator"].is_object());
    assert!(health["components"]["sampler"].is_object());
    assert!(health["components"]["stress"].is_object());
}

#[tokio::test]
async fn readyz_requires_the_ready_flag() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(false).await;

    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;
    state.metrics.observe_http_request("GET", 200, 0.001);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("scalewatch_http_requests_total"));
    assert!(metrics_text.contains("scalewatch_http_request_duration_seconds_bucket"));
}

#[tokio::test]
async fn record_event_rejects_missing_required_fields() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post_json(
        &app,
        "/scaling/record-event",
        json!({"event_type": "pod_scale_up"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], true);
    assert_eq!(error["error_type"], "missing_field");
    assert!(error["message"].as_str().unwrap().contains("trigger"));
}

#[tokio::test]
async fn record_event_rejects_empty_body() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post_json(&app, "/scaling/record-event", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error_type"], "invalid_request");
}

#[tokio::test]
async fn record_event_rejects_absent_body() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scaling/record-event")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error_type"], "invalid_request");
}

#[tokio::test]
async fn record_event_generates_event_id_and_timestamp() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        &app,
        "/scaling/record-event",
        json!({"event_type": "pod_scale_up", "trigger": "hpa_cpu"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["event_id"].as_str().unwrap().starts_with("scale_"));
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn history_defaults_to_a_24_hour_window() {
    let (app, _state) = setup_test_app().await;

    post_json(
        &app,
        "/scaling/record-event",
        json!({"event_type": "node_scale_up", "trigger": "karpenter"}),
    )
    .await;

    let (status, body) = get(&app, "/scaling/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["time_range"]["hours"], 24);
    assert_eq!(body["events"][0]["event_type"], "node_scale_up");
}

#[tokio::test]
async fn history_honors_the_hours_parameter() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(&app, "/scaling/history?hours=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_range"]["hours"], 2);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn events_alias_serves_the_history_payload() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(&app, "/scaling/history/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["events"].is_array());
}

#[tokio::test]
async fn recorded_metric_shows_up_in_trends_and_chart_data() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_json(
        &app,
        "/scaling/metrics/record",
        json!({"cpu_usage": 42.5, "pod_count": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, trends) = get(&app, "/scaling/history/trends").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trends["trends"]["data_points"], 1);
    assert_eq!(trends["trends"]["cpu_trend"][0]["value"], 42.5);
    // The sample carried no memory_usage, so no memory point exists.
    assert_eq!(trends["trends"]["memory_trend"].as_array().unwrap().len(), 0);

    let (status, chart) = get(&app, "/scaling/history/chart-data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chart["chart_data"]["cpu"]["data"][0], 42.5);
    assert_eq!(chart["chart_data"]["cpu"]["label"], "CPU Usage (%)");
    assert_eq!(chart["chart_data"]["pods"]["data"][0], 3.0);
}

#[tokio::test]
async fn record_metric_rejects_empty_body() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post_json(&app, "/scaling/metrics/record", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error_type"], "invalid_request");
}

#[tokio::test]
async fn statistics_echo_the_window_even_when_empty() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(&app, "/scaling/history/statistics?hours=6").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_events"], 0);
    assert_eq!(body["statistics"]["success_rate"], 0.0);
    assert_eq!(body["statistics"]["time_range"]["hours"], 6);
}

#[tokio::test]
async fn unknown_route_returns_the_error_envelope() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = get(&app, "/no/such/route").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], true);
    assert_eq!(error["error_type"], "not_found");
    assert!(error["message"].as_str().unwrap().contains("/no/such/route"));
}

#[tokio::test]
async fn every_request_lands_in_the_access_log() {
    let (app, state) = setup_test_app().await;

    get(&app, "/scaling/history").await;
    get(&app, "/no/such/route").await;

    let stats = state.aggregator.get_access_stats(1);
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.method_distribution["GET"], 2);
    assert_eq!(stats.status_distribution["404"], 1);
    assert_eq!(stats.pod_distribution["test-pod"], 2);
}

#[tokio::test]
async fn access_stats_endpoint_serves_the_window() {
    let (app, _state) = setup_test_app().await;

    // This request itself is the first access record once it completes,
    // so query twice and assert on the second response.
    get(&app, "/access/stats").await;
    let (status, body) = get(&app, "/access/stats?hours=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["statistics"]["total_requests"].as_u64().unwrap() >= 1);
    assert_eq!(body["statistics"]["time_range"]["hours"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stress_lifecycle_over_http() {
    let (app, _state) = setup_test_app().await;

    let (status, test) = post_json(
        &app,
        "/stress/cpu/start",
        json!({"duration_secs": 30, "intensity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(test["status"], "running");
    assert_eq!(test["test_type"], "cpu");

    let test_id = test["test_id"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/stress/status/{}", test_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["test_id"], test_id.as_str());

    let (status, body) = post_json(&app, &format!("/stress/stop/{}", test_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // The worker observes cancellation within one duty cycle.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let (_, body) = get(&app, &format!("/stress/status/{}", test_id)).await;
    assert_eq!(body["status"], "stopped");

    let (status, listing) = get(&app, "/stress/tests").await;
    assert_eq!(status, StatusCode::OK);
    assert!(listing["history"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["test_id"] == test_id.as_str()));
}

#[tokio::test]
async fn stress_status_for_unknown_id_is_not_found() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = get(&app, "/stress/status/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error_type"], "not_found");
}

#[tokio::test]
async fn stress_stop_for_unknown_id_is_not_found() {
    let (app, _state) = setup_test_app().await;

    let (status, error) = post_json(&app, "/stress/stop/does-not-exist", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error_type"], "not_found");
}

#[tokio::test]
async fn stress_start_with_absent_body_uses_defaults() {
    let (app, state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stress/memory/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let test: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(test["duration_secs"], 60);
    assert_eq!(test["target_mb"], 100);

    state.stress.stop(test["test_id"].as_str().unwrap());
}

#[tokio::test]
async fn resource_sample_from_helper_models_round_trips() {
    // The wire format keeps unknown keys, so integrations can attach
    // their own annotations without breaking ingestion.
    let sample: ResourceSample = serde_json::from_value(json!({
        "cpu_usage": 10.0,
        "region": "us-east-1",
    }))
    .unwrap();

    assert_eq!(sample.cpu_usage, Some(10.0));
    assert_eq!(sample.extra["region"], "us-east-1");
}
