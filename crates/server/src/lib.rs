//! HTTP service for the scalewatch telemetry aggregator

pub mod access_log;
pub mod api;
pub mod config;
pub mod error;
pub mod routes;
