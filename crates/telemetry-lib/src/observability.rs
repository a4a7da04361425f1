//! Observability infrastructure
//!
//! Provides:
//! - Prometheus metrics (HTTP traffic, ingestion counters, buffer
//!   occupancy, sampler cycles, running stress tests)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::info;

/// Histogram buckets for request latency (seconds).
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once).
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: Histogram,
    records_ingested_total: IntCounterVec,
    buffer_entries: IntGaugeVec,
    sampler_cycles_total: IntCounter,
    sampler_errors_total: IntCounter,
    stress_tests_running: IntGauge,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            http_requests_total: register_int_counter_vec!(
                "scalewatch_http_requests_total",
                "HTTP requests served, by method and response status",
                &["method", "status"]
            )
            .expect("Failed to register http_requests_total"),

            http_request_duration_seconds: register_histogram!(
                "scalewatch_http_request_duration_seconds",
                "Time spent serving HTTP requests",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register http_request_duration_seconds"),

            records_ingested_total: register_int_counter_vec!(
                "scalewatch_records_ingested_total",
                "Telemetry records ingested, by buffer",
                &["buffer"]
            )
            .expect("Failed to register records_ingested_total"),

            buffer_entries: register_int_gauge_vec!(
                "scalewatch_buffer_entries",
                "Current entries held per telemetry buffer",
                &["buffer"]
            )
            .expect("Failed to register buffer_entries"),

            sampler_cycles_total: register_int_counter!(
                "scalewatch_sampler_cycles_total",
                "Completed resource sampler cycles"
            )
            .expect("Failed to register sampler_cycles_total"),

            sampler_errors_total: register_int_counter!(
                "scalewatch_sampler_errors_total",
                "Resource sampler cycles that failed to query the cluster"
            )
            .expect("Failed to register sampler_errors_total"),

            stress_tests_running: register_int_gauge!(
                "scalewatch_stress_tests_running",
                "Stress tests currently executing"
            )
            .expect("Failed to register stress_tests_running"),
        }
    }
}

/// Service metrics for Prometheus exposition.
///
/// A lightweight handle to the global metrics instance; clones share
/// the same underlying registry entries.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record one served HTTP request.
    pub fn observe_http_request(&self, method: &str, status: u16, duration_secs: f64) {
        self.inner()
            .http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.inner()
            .http_request_duration_seconds
            .observe(duration_secs);
    }

    /// Count one ingested record for the named buffer.
    pub fn inc_records_ingested(&self, buffer: &str) {
        self.inner()
            .records_ingested_total
            .with_label_values(&[buffer])
            .inc();
    }

    /// Update buffer occupancy gauges.
    pub fn set_buffer_entries(&self, access: usize, scaling: usize, resource: usize) {
        let gauge = &self.inner().buffer_entries;
        gauge.with_label_values(&["access"]).set(access as i64);
        gauge.with_label_values(&["scaling"]).set(scaling as i64);
        gauge.with_label_values(&["resource"]).set(resource as i64);
    }

    pub fn inc_sampler_cycles(&self) {
        self.inner().sampler_cycles_total.inc();
    }

    pub fn inc_sampler_errors(&self) {
        self.inner().sampler_errors_total.inc();
    }

    pub fn inc_stress_running(&self) {
        self.inner().stress_tests_running.inc();
    }

    pub fn dec_stress_running(&self) {
        self.inner().stress_tests_running.dec();
    }
}

/// Structured logger for significant service events.
#[derive(Clone)]
pub struct StructuredLogger {
    pod_name: String,
}

impl StructuredLogger {
    pub fn new(pod_name: impl Into<String>) -> Self {
        Self {
            pod_name: pod_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            pod = %self.pod_name,
            version = %version,
            port = port,
            "Scalewatch service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            pod = %self.pod_name,
            reason = %reason,
            "Scalewatch service shutting down"
        );
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_handle_registers_once_and_records() {
        let metrics = ServiceMetrics::new();

        metrics.observe_http_request("GET", 200, 0.001);
        metrics.inc_records_ingested("access");
        metrics.set_buffer_entries(10, 2, 3);
        metrics.inc_sampler_cycles();
        metrics.inc_stress_running();
        metrics.dec_stress_running();

        // A second handle shares the same registry without panicking.
        let _again = ServiceMetrics::new();
    }

    #[test]
    fn structured_logger_holds_identity() {
        let logger = StructuredLogger::new("demo-pod");
        assert_eq!(logger.pod_name, "demo-pod");
    }
}
