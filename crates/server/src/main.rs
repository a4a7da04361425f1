//! Scalewatch - Autoscaling telemetry demo service
//!
//! Serves scaling history, resource trends and access statistics from
//! an in-memory aggregator, samples cluster resources on an interval,
//! and generates synthetic CPU/memory load on demand.

use anyhow::Result;
use scalewatch_server::{api, config};
use std::sync::Arc;
use std::time::Duration;
use telemetry_lib::{
    collector::{SamplerConfig, SamplerLoop, StaticClusterClient},
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    StressController, TelemetryAggregator,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting scalewatch");

    // Load configuration
    let config = config::ServiceConfig::load()?;
    info!(pod_name = %config.pod_name, node_name = %config.node_name, "Service configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::AGGREGATOR).await;
    health_registry.register(components::SAMPLER).await;
    health_registry.register(components::STRESS).await;

    // Initialize metrics and structured logging
    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(config.pod_name.clone());
    logger.log_startup(SERVICE_VERSION, config.port);

    // Core state: one aggregator and one stress controller per process
    let aggregator = Arc::new(TelemetryAggregator::new());
    let stress = Arc::new(StressController::new(metrics.clone()));

    // Start the resource sampler loop
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let sampler = SamplerLoop::new(
        Arc::clone(&aggregator),
        Arc::new(StaticClusterClient::new(
            config.cluster_pods,
            config.cluster_nodes,
        )),
        SamplerConfig {
            interval: Duration::from_secs(config.sample_interval_secs),
            namespace: config.namespace.clone(),
        },
        metrics.clone(),
    );
    let sampler_handle = tokio::spawn(sampler.run(shutdown_tx.subscribe()));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        aggregator,
        stress,
        health_registry.clone(),
        metrics,
        config.pod_name.clone(),
        config.node_name.clone(),
    ));

    // Mark the service as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    let _ = sampler_handle.await;
    api_handle.abort();

    Ok(())
}
