//! Data models for the telemetry aggregator
//!
//! Every record kind carries an ISO-8601 UTC timestamp string with a
//! trailing `Z`. Fields beyond the mandatory timestamp are optional:
//! a record missing a field is simply excluded from the aggregates
//! that need it, never rejected. Unknown keys submitted by callers are
//! preserved through `#[serde(flatten)]` so the wire format stays
//! open to external integrations.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Format a UTC instant as ISO-8601 with microsecond precision and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Current UTC time in the wire format used by all records.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse a record timestamp.
///
/// Accepts RFC 3339 as well as the naive `...Z`-suffixed form the
/// original integrations send. An unparseable or missing value maps to
/// the minimum UTC instant so the record sorts as arbitrarily old
/// instead of failing ingestion.
pub fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return DateTime::<Utc>::MIN_UTC;
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }

    let naive = raw.trim_end_matches('Z');
    if let Ok(ts) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.and_utc();
    }

    DateTime::<Utc>::MIN_UTC
}

/// Round to two decimal places, as reported in percentage and average fields.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One HTTP request observed by the application. Immutable once recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle status of a scaling event.
///
/// External integrations report free-form statuses; anything outside
/// the known set is kept as `Unknown` rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One observed or externally-reported autoscaling action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalingEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Free-form details; `duration_seconds` inside it feeds the
    /// average-duration statistic when present.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScalingEvent {
    /// Duration reported under `details.duration_seconds`, if any.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.details.get("duration_seconds").and_then(Value::as_f64)
    }

    /// True when the caller supplied no fields at all.
    pub fn is_empty(&self) -> bool {
        self.event_id.is_none()
            && self.timestamp.is_none()
            && self.event_type.is_none()
            && self.trigger.is_none()
            && self.details.is_empty()
            && self.status.is_none()
            && self.extra.is_empty()
    }
}

/// One point-in-time snapshot of cluster resource utilization.
///
/// Each metric field is independently optional; a sample missing
/// `memory_usage` still contributes to the other three trend series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceSample {
    /// True when the caller supplied no fields at all.
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.cpu_usage.is_none()
            && self.memory_usage.is_none()
            && self.pod_count.is_none()
            && self.node_count.is_none()
            && self.extra.is_empty()
    }
}

/// The look-back window a query covered, echoed in every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
    pub hours: u32,
}

impl TimeRange {
    pub fn new(cutoff: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: format_timestamp(cutoff),
            end: now_timestamp(),
            hours,
        }
    }
}

/// Windowed access-log statistics.
///
/// Distributions use ordered maps so repeated queries over the same
/// data serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStats {
    pub time_range: TimeRange,
    pub total_requests: usize,
    pub unique_ips: usize,
    pub path_distribution: BTreeMap<String, u64>,
    pub method_distribution: BTreeMap<String, u64>,
    pub status_distribution: BTreeMap<String, u64>,
    pub avg_response_time_ms: f64,
    pub error_count: u64,
    pub error_rate: f64,
    pub pod_distribution: BTreeMap<String, u64>,
}

impl AccessStats {
    pub fn empty(time_range: TimeRange) -> Self {
        Self {
            time_range,
            total_requests: 0,
            unique_ips: 0,
            path_distribution: BTreeMap::new(),
            method_distribution: BTreeMap::new(),
            status_distribution: BTreeMap::new(),
            avg_response_time_ms: 0.0,
            error_count: 0,
            error_rate: 0.0,
            pod_distribution: BTreeMap::new(),
        }
    }
}

/// Windowed scaling-event statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingStats {
    pub time_range: TimeRange,
    pub total_events: usize,
    pub event_type_distribution: BTreeMap<String, u64>,
    pub avg_response_time_seconds: f64,
    pub successful_events: u64,
    pub failed_events: u64,
    pub success_rate: f64,
}

impl ScalingStats {
    pub fn empty(time_range: TimeRange) -> Self {
        Self {
            time_range,
            total_events: 0,
            event_type_distribution: BTreeMap::new(),
            avg_response_time_seconds: 0.0,
            successful_events: 0,
            failed_events: 0,
            success_rate: 0.0,
        }
    }
}

/// A single point in a resource trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    pub value: f64,
}

/// Windowed resource utilization trends, time-sorted ascending for
/// chronological plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTrends {
    pub time_range: TimeRange,
    pub cpu_trend: Vec<TrendPoint>,
    pub memory_trend: Vec<TrendPoint>,
    pub pod_count_trend: Vec<TrendPoint>,
    pub node_count_trend: Vec<TrendPoint>,
    pub data_points: usize,
}

impl ResourceTrends {
    pub fn empty(time_range: TimeRange) -> Self {
        Self {
            time_range,
            cpu_trend: Vec::new(),
            memory_trend: Vec::new(),
            pod_count_trend: Vec::new(),
            node_count_trend: Vec::new(),
            data_points: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_z_suffixed_iso() {
        let ts = parse_timestamp(Some("2026-08-30T12:00:00.123456Z"));
        assert_eq!(ts.format("%Y-%m-%dT%H:%M:%S").to_string(), "2026-08-30T12:00:00");
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_offset() {
        let ts = parse_timestamp(Some("2026-08-30T12:00:00+02:00"));
        assert_eq!(ts.format("%H").to_string(), "10");
    }

    #[test]
    fn parse_timestamp_treats_garbage_as_arbitrarily_old() {
        assert_eq!(parse_timestamp(Some("not-a-time")), DateTime::<Utc>::MIN_UTC);
        assert_eq!(parse_timestamp(None), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn timestamp_round_trips_through_wire_format() {
        let rendered = now_timestamp();
        assert!(rendered.ends_with('Z'));
        assert_ne!(parse_timestamp(Some(&rendered)), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn round2_rounds_half_up() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn event_status_tolerates_unknown_values() {
        let status: EventStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, EventStatus::InProgress);

        let status: EventStatus = serde_json::from_str("\"exploded\"").unwrap();
        assert_eq!(status, EventStatus::Unknown);
    }

    #[test]
    fn scaling_event_preserves_unknown_keys() {
        let event: ScalingEvent = serde_json::from_value(serde_json::json!({
            "event_type": "pod_scale_up",
            "trigger": "hpa",
            "replicas": 5,
        }))
        .unwrap();

        assert_eq!(event.event_type.as_deref(), Some("pod_scale_up"));
        assert_eq!(event.extra["replicas"], 5);
        assert!(!event.is_empty());
    }

    #[test]
    fn empty_records_are_detectable() {
        assert!(ScalingEvent::default().is_empty());
        assert!(ResourceSample::default().is_empty());
    }

    #[test]
    fn duration_seconds_reads_from_details() {
        let event: ScalingEvent = serde_json::from_value(serde_json::json!({
            "details": {"duration_seconds": 12.5, "reason": "cpu"},
        }))
        .unwrap();
        assert_eq!(event.duration_seconds(), Some(12.5));
        assert_eq!(ScalingEvent::default().duration_seconds(), None);
    }
}
