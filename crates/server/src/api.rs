//! HTTP API wiring: shared state, router, health and metrics handlers

use crate::access_log;
use crate::error::ApiError;
use crate::routes;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use telemetry_lib::{
    ComponentStatus, HealthRegistry, ServiceMetrics, StressController, TelemetryAggregator,
};
use tracing::info;

/// Shared application state, handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<TelemetryAggregator>,
    pub stress: Arc<StressController>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    /// Pod identity stamped onto access records
    pub pod_name: String,
    /// Node identity stamped onto access records
    pub node_name: String,
}

impl AppState {
    pub fn new(
        aggregator: Arc<TelemetryAggregator>,
        stress: Arc<StressController>,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        pod_name: impl Into<String>,
        node_name: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            stress,
            health_registry,
            metrics,
            pod_name: pod_name.into(),
            node_name: node_name.into(),
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return ApiError::Internal(e.into()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Unknown routes get the same JSON error envelope as everything else.
async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .merge(routes::scaling::router())
        .merge(routes::stress::router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_log::record_request,
        ))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
