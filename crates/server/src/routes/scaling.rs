//! Scaling history, statistics and telemetry ingestion endpoints

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use telemetry_lib::models::{now_timestamp, ResourceSample, ScalingEvent, TimeRange, TrendPoint};
use tracing::info;

/// Look-back window query parameter, defaulting to the retention horizon.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_hours")]
    pub hours: u32,
}

fn default_hours() -> u32 {
    24
}

impl Default for WindowQuery {
    fn default() -> Self {
        Self {
            hours: default_hours(),
        }
    }
}

fn time_range(hours: u32) -> TimeRange {
    TimeRange::new(Utc::now() - Duration::hours(i64::from(hours)), hours)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scaling/history", get(history))
        .route("/scaling/history/events", get(history))
        .route("/scaling/history/trends", get(trends))
        .route("/scaling/history/statistics", get(statistics))
        .route("/scaling/history/chart-data", get(chart_data))
        .route("/scaling/record-event", post(record_event))
        .route("/scaling/metrics/record", post(record_metric))
        .route("/access/stats", get(access_stats))
}

/// Scaling events in the window, most recent first.
async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<Value> {
    let events = state.aggregator.get_scaling_history(query.hours);

    Json(json!({
        "success": true,
        "count": events.len(),
        "events": events,
        "time_range": time_range(query.hours),
        "timestamp": now_timestamp(),
    }))
}

/// Resource utilization trend series for the window.
async fn trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<Value> {
    let trends = state.aggregator.get_resource_trends(query.hours);

    Json(json!({
        "success": true,
        "trends": trends,
        "timestamp": now_timestamp(),
    }))
}

/// Aggregate scaling statistics for the window.
async fn statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<Value> {
    let statistics = state.aggregator.get_scaling_statistics(query.hours);

    Json(json!({
        "success": true,
        "statistics": statistics,
        "timestamp": now_timestamp(),
    }))
}

/// Trend series projected into a chart-friendly labels/data shape.
async fn chart_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<Value> {
    let trends = state.aggregator.get_resource_trends(query.hours);

    Json(json!({
        "success": true,
        "chart_data": {
            "cpu": chart_series(&trends.cpu_trend, "CPU Usage (%)"),
            "memory": chart_series(&trends.memory_trend, "Memory Usage (%)"),
            "pods": chart_series(&trends.pod_count_trend, "Pod Count"),
            "nodes": chart_series(&trends.node_count_trend, "Node Count"),
        },
        "timestamp": now_timestamp(),
    }))
}

fn chart_series(points: &[TrendPoint], label: &str) -> Value {
    json!({
        "labels": points.iter().map(|p| p.timestamp.as_str()).collect::<Vec<_>>(),
        "data": points.iter().map(|p| p.value).collect::<Vec<_>>(),
        "label": label,
    })
}

/// Access-log statistics for the window.
async fn access_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Json<Value> {
    let statistics = state.aggregator.get_access_stats(query.hours);

    Json(json!({
        "success": true,
        "statistics": statistics,
        "timestamp": now_timestamp(),
    }))
}

/// Accept an externally-reported scaling event.
async fn record_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScalingEvent>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) =
        payload.map_err(|e| ApiError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

    if event.is_empty() {
        return Err(ApiError::InvalidRequest("Request body is empty".to_string()));
    }

    let Some(event_type) = event.event_type.clone() else {
        return Err(ApiError::MissingField("event_type"));
    };
    let Some(trigger) = event.trigger.clone() else {
        return Err(ApiError::MissingField("trigger"));
    };

    let event_id = state.aggregator.record_scaling_event(event);
    state.metrics.inc_records_ingested("scaling");

    info!(
        event_id = %event_id,
        event_type = %event_type,
        trigger = %trigger,
        "Scaling event recorded"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Scaling event recorded",
        "event_id": event_id,
        "timestamp": now_timestamp(),
    })))
}

/// Accept an externally-reported resource sample.
async fn record_metric(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResourceSample>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(sample) =
        payload.map_err(|e| ApiError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

    if sample.is_empty() {
        return Err(ApiError::InvalidRequest("Request body is empty".to_string()));
    }

    state.aggregator.record_resource_metric(sample);
    state.metrics.inc_records_ingested("resource");

    Ok(Json(json!({
        "success": true,
        "message": "Resource metric recorded",
        "timestamp": now_timestamp(),
    })))
}
