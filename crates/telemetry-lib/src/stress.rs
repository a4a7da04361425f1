//! Synthetic CPU/memory load generation
//!
//! Demonstrates autoscaling by burning CPU or holding memory from
//! explicit, cancellable background workers. Each worker owns a
//! status state machine (running -> stopped | completed | failed) and
//! checks a cancellation flag cooperatively once per duty cycle.

use crate::models::{now_timestamp, parse_timestamp};
use crate::observability::ServiceMetrics;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Duty cycle length for both worker kinds.
const CYCLE: Duration = Duration::from_millis(100);
/// Allocation unit for the memory worker.
const MEMORY_CHUNK_BYTES: usize = 1024 * 1024;
/// Retained finished-test records.
const MAX_HISTORY: usize = 100;

/// Hard bounds on caller-supplied parameters.
const DURATION_RANGE_SECS: (u64, u64) = (1, 300);
const INTENSITY_RANGE: (u8, u8) = (1, 100);
const TARGET_MB_RANGE: (u64, u64) = (10, 500);

/// Kind of load a stress test generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressKind {
    Cpu,
    Memory,
}

/// Lifecycle state of a stress test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressStatus {
    Running,
    Stopped,
    Completed,
    Failed,
}

/// One stress test, active or finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTest {
    pub test_id: String,
    pub test_type: StressKind,
    pub status: StressStatus,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal outcome reported by a worker.
struct WorkerOutcome {
    status: StressStatus,
    error: Option<String>,
}

impl WorkerOutcome {
    fn completed() -> Self {
        Self {
            status: StressStatus::Completed,
            error: None,
        }
    }

    fn stopped() -> Self {
        Self {
            status: StressStatus::Stopped,
            error: None,
        }
    }
}

struct ActiveTest {
    info: StressTest,
    cancel: watch::Sender<bool>,
}

/// Owner of all stress workers.
///
/// Handlers hold it behind an `Arc`; workers report their terminal
/// state back through [`StressController::finish`].
pub struct StressController {
    active: Mutex<HashMap<String, ActiveTest>>,
    history: Mutex<Vec<StressTest>>,
    metrics: ServiceMetrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StressController {
    pub fn new(metrics: ServiceMetrics) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            metrics,
        }
    }

    /// Start a CPU stress worker. Parameters are clamped to safe
    /// bounds; returns the initial test record.
    pub fn start_cpu(self: &Arc<Self>, duration_secs: u64, intensity: u8) -> StressTest {
        let duration_secs = duration_secs.clamp(DURATION_RANGE_SECS.0, DURATION_RANGE_SECS.1);
        let intensity = intensity.clamp(INTENSITY_RANGE.0, INTENSITY_RANGE.1);

        let info = StressTest {
            test_id: Uuid::new_v4().to_string(),
            test_type: StressKind::Cpu,
            status: StressStatus::Running,
            start_time: now_timestamp(),
            end_time: None,
            duration_secs,
            intensity: Some(intensity),
            target_mb: None,
            error: None,
        };

        self.launch(info.clone(), move |cancel| {
            run_cpu_worker(duration_secs, intensity, cancel)
        });
        info
    }

    /// Start a memory stress worker. Parameters are clamped to safe
    /// bounds; returns the initial test record.
    pub fn start_memory(self: &Arc<Self>, duration_secs: u64, target_mb: u64) -> StressTest {
        let duration_secs = duration_secs.clamp(DURATION_RANGE_SECS.0, DURATION_RANGE_SECS.1);
        let target_mb = target_mb.clamp(TARGET_MB_RANGE.0, TARGET_MB_RANGE.1);

        let info = StressTest {
            test_id: Uuid::new_v4().to_string(),
            test_type: StressKind::Memory,
            status: StressStatus::Running,
            start_time: now_timestamp(),
            end_time: None,
            duration_secs,
            intensity: None,
            target_mb: Some(target_mb),
            error: None,
        };

        self.launch(info.clone(), move |cancel| {
            run_memory_worker(duration_secs, target_mb, cancel)
        });
        info
    }

    /// Signal cancellation to a running test. Returns false when no
    /// test with this id is currently running.
    pub fn stop(&self, test_id: &str) -> bool {
        let active = lock(&self.active);
        match active.get(test_id) {
            Some(test) => {
                let _ = test.cancel.send(true);
                true
            }
            None => false,
        }
    }

    /// Current state of a test, running or finished.
    pub fn status(&self, test_id: &str) -> Option<StressTest> {
        if let Some(test) = lock(&self.active).get(test_id) {
            return Some(test.info.clone());
        }

        lock(&self.history)
            .iter()
            .find(|t| t.test_id == test_id)
            .cloned()
    }

    /// All currently running tests.
    pub fn active_tests(&self) -> Vec<StressTest> {
        lock(&self.active).values().map(|t| t.info.clone()).collect()
    }

    /// Most recently finished tests, newest first.
    pub fn history(&self, limit: usize) -> Vec<StressTest> {
        let history = lock(&self.history);
        history.iter().rev().take(limit).cloned().collect()
    }

    /// Drop finished records older than `max_age_secs`. Returns the
    /// number of records removed.
    pub fn cleanup(&self, max_age_secs: i64) -> usize {
        let cutoff = Utc::now() - ChronoDuration::seconds(max_age_secs);
        let mut history = lock(&self.history);
        let before = history.len();
        history.retain(|t| parse_timestamp(t.end_time.as_deref()) >= cutoff);
        before - history.len()
    }

    fn launch(
        self: &Arc<Self>,
        info: StressTest,
        worker: impl FnOnce(&watch::Receiver<bool>) -> WorkerOutcome + Send + 'static,
    ) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let test_id = info.test_id.clone();

        info!(
            test_id = %test_id,
            kind = ?info.test_type,
            duration_secs = info.duration_secs,
            "Starting stress test"
        );

        lock(&self.active).insert(
            test_id.clone(),
            ActiveTest {
                info,
                cancel: cancel_tx,
            },
        );
        self.metrics.inc_stress_running();

        let controller = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let outcome = worker(&cancel_rx);
            controller.finish(&test_id, outcome);
        });
    }

    /// Record a worker's terminal state and archive the test.
    fn finish(&self, test_id: &str, outcome: WorkerOutcome) {
        let Some(test) = lock(&self.active).remove(test_id) else {
            return;
        };

        let mut info = test.info;
        info.status = outcome.status;
        info.end_time = Some(now_timestamp());
        info.error = outcome.error;

        info!(
            test_id = %test_id,
            status = ?info.status,
            "Stress test finished"
        );

        let mut history = lock(&self.history);
        history.push(info);
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }
        self.metrics.dec_stress_running();
    }
}

/// Busy-loop `intensity` percent of each duty cycle until the deadline,
/// checking cancellation between cycles.
fn run_cpu_worker(duration_secs: u64, intensity: u8, cancel: &watch::Receiver<bool>) -> WorkerOutcome {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let busy = Duration::from_millis(u64::from(intensity));

    while Instant::now() < deadline {
        if *cancel.borrow() {
            return WorkerOutcome::stopped();
        }

        let cycle_start = Instant::now();
        let mut x = 0u64;
        while cycle_start.elapsed() < busy {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            std::hint::black_box(x);
        }

        if let Some(rest) = CYCLE.checked_sub(cycle_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    WorkerOutcome::completed()
}

/// Allocate and touch memory up to the target, hold it until the
/// deadline, checking cancellation between cycles.
fn run_memory_worker(
    duration_secs: u64,
    target_mb: u64,
    cancel: &watch::Receiver<bool>,
) -> WorkerOutcome {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let mut held: Vec<Vec<u8>> = Vec::with_capacity(target_mb as usize);

    for _ in 0..target_mb {
        if *cancel.borrow() {
            return WorkerOutcome::stopped();
        }

        let mut chunk = vec![0u8; MEMORY_CHUNK_BYTES];
        // Touch each page so the allocation is actually resident.
        for page in chunk.chunks_mut(4096) {
            page[0] = 1;
        }
        held.push(chunk);
    }
    std::hint::black_box(&held);

    while Instant::now() < deadline {
        if *cancel.borrow() {
            return WorkerOutcome::stopped();
        }
        std::thread::sleep(CYCLE);
    }

    drop(held);
    WorkerOutcome::completed()
}
