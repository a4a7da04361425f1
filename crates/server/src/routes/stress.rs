//! Stress test control endpoints

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use telemetry_lib::models::now_timestamp;
use telemetry_lib::{ComponentStatus, StressTest};

const DEFAULT_DURATION_SECS: u64 = 60;
const DEFAULT_CPU_INTENSITY: u8 = 80;
const DEFAULT_MEMORY_TARGET_MB: u64 = 100;

/// Stress tests retained in the `/stress/tests` listing.
const LISTED_HISTORY: usize = 20;

#[derive(Debug, Default, Deserialize)]
struct CpuStressRequest {
    duration_secs: Option<u64>,
    intensity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryStressRequest {
    duration_secs: Option<u64>,
    target_mb: Option<u64>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stress/cpu/start", post(start_cpu))
        .route("/stress/memory/start", post(start_memory))
        .route("/stress/status/:test_id", get(status))
        .route("/stress/stop/:test_id", post(stop))
        .route("/stress/tests", get(list_tests))
}

/// New stress work is refused while any component is down.
async fn ensure_operational(state: &AppState) -> Result<(), ApiError> {
    let health = state.health_registry.health().await;
    if health.status == ComponentStatus::Unhealthy {
        return Err(ApiError::ServiceUnavailable);
    }
    Ok(())
}

async fn start_cpu(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CpuStressRequest>, JsonRejection>,
) -> Result<Json<StressTest>, ApiError> {
    ensure_operational(&state).await?;

    // The body is optional; an absent or empty body means defaults.
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let test = state.stress.start_cpu(
        request.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
        request.intensity.unwrap_or(DEFAULT_CPU_INTENSITY),
    );

    Ok(Json(test))
}

async fn start_memory(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MemoryStressRequest>, JsonRejection>,
) -> Result<Json<StressTest>, ApiError> {
    ensure_operational(&state).await?;

    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let test = state.stress.start_memory(
        request.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
        request.target_mb.unwrap_or(DEFAULT_MEMORY_TARGET_MB),
    );

    Ok(Json(test))
}

async fn status(
    State(state): State<Arc<AppState>>,
    Path(test_id): Path<String>,
) -> Result<Json<StressTest>, ApiError> {
    state
        .stress
        .status(&test_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No stress test with id {}", test_id)))
}

async fn stop(
    State(state): State<Arc<AppState>>,
    Path(test_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.stress.stop(&test_id) {
        return Err(ApiError::NotFound(format!(
            "No running stress test with id {}",
            test_id
        )));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Stress test stopping",
        "test_id": test_id,
        "timestamp": now_timestamp(),
    })))
}

async fn list_tests(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "active": state.stress.active_tests(),
        "history": state.stress.history(LISTED_HISTORY),
        "timestamp": now_timestamp(),
    }))
}
