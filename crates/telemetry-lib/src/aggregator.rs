//! In-memory telemetry aggregator
//!
//! Thread-safe ingestion and windowed querying for the three record
//! kinds the service tracks: access logs, scaling events and resource
//! samples. Each kind lives in its own bounded buffer behind its own
//! lock, so operations on one buffer never block the others. Buffers
//! are capped (FIFO eviction by truncation to the tail) and purged of
//! entries older than the retention horizon on every insert.
//!
//! The aggregator performs no I/O and has no failure mode: malformed
//! or partial records are absorbed with field-presence checks.

use crate::models::{
    format_timestamp, now_timestamp, parse_timestamp, round2, AccessRecord, AccessStats,
    EventStatus, ResourceSample, ResourceTrends, ScalingEvent, ScalingStats, TimeRange,
    TrendPoint,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Maximum retained access records.
pub const MAX_ACCESS_RECORDS: usize = 10_000;
/// Maximum retained scaling events.
pub const MAX_SCALING_EVENTS: usize = 1_000;
/// Maximum retained resource samples.
pub const MAX_RESOURCE_SAMPLES: usize = 1_000;
/// Records older than this horizon are purged regardless of query windows.
pub const RETENTION_HOURS: i64 = 24;

/// Process-wide telemetry store.
///
/// Constructed once at startup and handed to request handlers by
/// reference; callers only ever receive snapshots, never references
/// into the live buffers.
#[derive(Debug, Default)]
pub struct TelemetryAggregator {
    access: Mutex<Buffer<AccessRecord>>,
    scaling: Mutex<Buffer<ScalingEvent>>,
    resource: Mutex<Buffer<ResourceSample>>,
}

/// A poisoned buffer still holds consistent data (mutations are
/// single push/retain calls), so recover the guard instead of failing.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One bounded buffer plus a lower bound on the oldest timestamp it
/// holds. Callers may insert records with arbitrary timestamps in any
/// order, so the bound is tracked explicitly instead of assuming the
/// front entry is the oldest; the full retention scan only runs when
/// something can actually have expired.
#[derive(Debug)]
struct Buffer<T> {
    entries: Vec<T>,
    oldest: DateTime<Utc>,
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            oldest: DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl<T> Buffer<T> {
    /// Insert with FIFO cap and retention purge. Unparseable
    /// timestamps count as arbitrarily old and expire immediately.
    fn insert(&mut self, item: T, max_len: usize, timestamp_of: impl Fn(&T) -> Option<&str>) {
        self.oldest = self.oldest.min(parse_timestamp(timestamp_of(&item)));
        self.entries.push(item);

        if self.entries.len() > max_len {
            let excess = self.entries.len() - max_len;
            self.entries.drain(..excess);
        }

        // `oldest` is a lower bound (cap eviction may remove the
        // minimum without raising it), so a hit here can be spurious;
        // the scan re-establishes the exact minimum either way.
        let cutoff = Utc::now() - Duration::hours(RETENTION_HOURS);
        if self.oldest < cutoff {
            self.entries
                .retain(|entry| parse_timestamp(timestamp_of(entry)) >= cutoff);
            self.oldest = self
                .entries
                .iter()
                .map(|entry| parse_timestamp(timestamp_of(entry)))
                .min()
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.oldest = DateTime::<Utc>::MAX_UTC;
    }
}

impl TelemetryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed HTTP request. Never fails.
    pub fn record_access(&self, mut record: AccessRecord) {
        if record.timestamp.is_none() {
            record.timestamp = Some(now_timestamp());
        }

        lock(&self.access).insert(record, MAX_ACCESS_RECORDS, |r| r.timestamp.as_deref());
    }

    /// Access-log statistics over the trailing `hours` window.
    pub fn get_access_stats(&self, hours: u32) -> AccessStats {
        let cutoff = window_cutoff(hours);
        let recent = self.snapshot_access(cutoff);
        let time_range = TimeRange::new(cutoff, hours);

        if recent.is_empty() {
            return AccessStats::empty(time_range);
        }

        let mut unique_ips = HashSet::new();
        let mut path_distribution = BTreeMap::new();
        let mut method_distribution = BTreeMap::new();
        let mut status_distribution = BTreeMap::new();
        let mut pod_distribution = BTreeMap::new();
        let mut response_times = Vec::new();
        let mut error_count = 0u64;

        for record in &recent {
            if let Some(ip) = &record.client_ip {
                unique_ips.insert(ip.clone());
            }
            if let Some(path) = &record.request_path {
                *path_distribution.entry(path.clone()).or_insert(0) += 1;
            }
            if let Some(method) = &record.request_method {
                *method_distribution.entry(method.clone()).or_insert(0) += 1;
            }
            if let Some(status) = record.response_status {
                *status_distribution.entry(status.to_string()).or_insert(0) += 1;
                if status >= 400 {
                    error_count += 1;
                }
            }
            if let Some(pod) = &record.pod_name {
                *pod_distribution.entry(pod.clone()).or_insert(0) += 1;
            }
            if let Some(ms) = record.response_time_ms {
                response_times.push(ms);
            }
        }

        let avg_response_time_ms = if response_times.is_empty() {
            0.0
        } else {
            round2(response_times.iter().sum::<f64>() / response_times.len() as f64)
        };

        let total_requests = recent.len();
        AccessStats {
            time_range,
            total_requests,
            unique_ips: unique_ips.len(),
            path_distribution,
            method_distribution,
            status_distribution,
            avg_response_time_ms,
            error_count,
            error_rate: round2(error_count as f64 / total_requests as f64 * 100.0),
            pod_distribution,
        }
    }

    /// Record an autoscaling event, filling in the timestamp and a
    /// generated `scale_`-prefixed event id when absent.
    ///
    /// Returns the event id under which the event was stored.
    pub fn record_scaling_event(&self, mut event: ScalingEvent) -> String {
        if event.timestamp.is_none() {
            event.timestamp = Some(now_timestamp());
        }
        let event_id = event
            .event_id
            .get_or_insert_with(|| format!("scale_{}", Utc::now().format("%Y%m%d_%H%M%S_%6f")))
            .clone();

        lock(&self.scaling).insert(event, MAX_SCALING_EVENTS, |e| e.timestamp.as_deref());

        event_id
    }

    /// Scaling events in the trailing window, most recent first.
    pub fn get_scaling_history(&self, hours: u32) -> Vec<ScalingEvent> {
        let cutoff = window_cutoff(hours);
        let mut recent: Vec<ScalingEvent> = {
            let buffer = lock(&self.scaling);
            buffer
                .entries
                .iter()
                .filter(|e| parse_timestamp(e.timestamp.as_deref()) >= cutoff)
                .cloned()
                .collect()
        };

        // Stable descending sort; ties keep insertion order.
        recent.sort_by(|a, b| {
            parse_timestamp(b.timestamp.as_deref()).cmp(&parse_timestamp(a.timestamp.as_deref()))
        });
        recent
    }

    /// Aggregate statistics over the windowed scaling history.
    pub fn get_scaling_statistics(&self, hours: u32) -> ScalingStats {
        let cutoff = window_cutoff(hours);
        let events = self.get_scaling_history(hours);
        let time_range = TimeRange::new(cutoff, hours);

        if events.is_empty() {
            return ScalingStats::empty(time_range);
        }

        let mut event_type_distribution = BTreeMap::new();
        let mut durations = Vec::new();
        let mut successful_events = 0u64;
        let mut failed_events = 0u64;

        for event in &events {
            if let Some(event_type) = &event.event_type {
                *event_type_distribution.entry(event_type.clone()).or_insert(0) += 1;
            }
            if let Some(duration) = event.duration_seconds() {
                durations.push(duration);
            }
            match event.status {
                Some(EventStatus::Completed) => successful_events += 1,
                Some(EventStatus::Failed) => failed_events += 1,
                _ => {}
            }
        }

        let avg_response_time_seconds = if durations.is_empty() {
            0.0
        } else {
            round2(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        let total_events = events.len();
        ScalingStats {
            time_range,
            total_events,
            event_type_distribution,
            avg_response_time_seconds,
            successful_events,
            failed_events,
            success_rate: round2(successful_events as f64 / total_events as f64 * 100.0),
        }
    }

    /// Record a resource utilization sample. Never fails.
    pub fn record_resource_metric(&self, mut sample: ResourceSample) {
        if sample.timestamp.is_none() {
            sample.timestamp = Some(now_timestamp());
        }

        lock(&self.resource).insert(sample, MAX_RESOURCE_SAMPLES, |s| s.timestamp.as_deref());
    }

    /// Per-metric trend series over the trailing window, oldest first.
    ///
    /// A sample contributes a point only to the series whose field it
    /// actually carries.
    pub fn get_resource_trends(&self, hours: u32) -> ResourceTrends {
        let cutoff = window_cutoff(hours);
        let mut recent: Vec<ResourceSample> = {
            let buffer = lock(&self.resource);
            buffer
                .entries
                .iter()
                .filter(|s| parse_timestamp(s.timestamp.as_deref()) >= cutoff)
                .cloned()
                .collect()
        };
        let time_range = TimeRange::new(cutoff, hours);

        if recent.is_empty() {
            return ResourceTrends::empty(time_range);
        }

        recent.sort_by(|a, b| {
            parse_timestamp(a.timestamp.as_deref()).cmp(&parse_timestamp(b.timestamp.as_deref()))
        });

        let mut trends = ResourceTrends::empty(time_range);
        trends.data_points = recent.len();

        for sample in &recent {
            let timestamp = sample.timestamp.clone().unwrap_or_default();
            if let Some(value) = sample.cpu_usage {
                trends.cpu_trend.push(TrendPoint { timestamp: timestamp.clone(), value });
            }
            if let Some(value) = sample.memory_usage {
                trends.memory_trend.push(TrendPoint { timestamp: timestamp.clone(), value });
            }
            if let Some(count) = sample.pod_count {
                trends.pod_count_trend.push(TrendPoint {
                    timestamp: timestamp.clone(),
                    value: count as f64,
                });
            }
            if let Some(count) = sample.node_count {
                trends.node_count_trend.push(TrendPoint { timestamp, value: count as f64 });
            }
        }

        trends
    }

    /// Current entry counts per buffer (access, scaling, resource),
    /// used for gauge exposition.
    pub fn buffer_sizes(&self) -> (usize, usize, usize) {
        (
            lock(&self.access).entries.len(),
            lock(&self.scaling).entries.len(),
            lock(&self.resource).entries.len(),
        )
    }

    /// Empty all three buffers. Test isolation only, not part of the
    /// production contract.
    pub fn clear_all(&self) {
        lock(&self.access).clear();
        lock(&self.scaling).clear();
        lock(&self.resource).clear();
    }

    fn snapshot_access(&self, cutoff: DateTime<Utc>) -> Vec<AccessRecord> {
        let buffer = lock(&self.access);
        buffer
            .entries
            .iter()
            .filter(|r| parse_timestamp(r.timestamp.as_deref()) >= cutoff)
            .cloned()
            .collect()
    }
}

fn window_cutoff(hours: u32) -> DateTime<Utc> {
    Utc::now() - Duration::hours(i64::from(hours))
}
