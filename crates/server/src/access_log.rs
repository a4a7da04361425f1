//! Access-log middleware
//!
//! Turns every served request into an [`AccessRecord`] so the traffic
//! the service handles shows up in its own telemetry, the same way
//! the demo application logged its requests.

use crate::api::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use telemetry_lib::models::{round2, AccessRecord};

/// Record the request into the access buffer and HTTP metrics.
pub async fn record_request(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let client_ip = forwarded_for(&request)
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()));

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    state
        .metrics
        .observe_http_request(&method, status, elapsed.as_secs_f64());
    state.metrics.inc_records_ingested("access");

    state.aggregator.record_access(AccessRecord {
        pod_name: Some(state.pod_name.clone()),
        node_name: Some(state.node_name.clone()),
        client_ip,
        request_path: Some(path),
        request_method: Some(method),
        user_agent,
        response_status: Some(status),
        response_time_ms: Some(round2(elapsed.as_secs_f64() * 1000.0)),
        ..Default::default()
    });

    response
}

/// First hop of `x-forwarded-for`, when a proxy supplied one.
fn forwarded_for(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
