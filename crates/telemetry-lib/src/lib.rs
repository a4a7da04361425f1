//! Telemetry library for the scalewatch demo service
//!
//! This crate provides the core functionality for:
//! - In-memory telemetry aggregation (access logs, scaling events,
//!   resource samples) with windowed queries
//! - Periodic cluster resource sampling
//! - CPU/memory stress generation for autoscaling demos
//! - Health checks and observability

pub mod aggregator;
pub mod collector;
pub mod health;
pub mod models;
pub mod observability;
pub mod stress;

pub use aggregator::TelemetryAggregator;
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use stress::{StressController, StressKind, StressStatus, StressTest};
