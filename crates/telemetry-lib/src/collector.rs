//! Periodic cluster resource sampling
//!
//! Feeds the aggregator with one [`ResourceSample`] per cycle: host
//! CPU/memory utilization from sysinfo plus pod/node counts from the
//! cluster client. A failed cluster query degrades the sample (the
//! affected fields are simply absent) instead of skipping the cycle.

use crate::aggregator::TelemetryAggregator;
use crate::models::{round2, ResourceSample};
use crate::observability::ServiceMetrics;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Narrow interface to the cluster control plane.
///
/// The real control plane is an external collaborator; only the two
/// counts the sampler needs cross this seam.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn pod_count(&self, namespace: &str) -> Result<u64>;
    async fn node_count(&self) -> Result<u64>;
}

/// Fixed-answer cluster client for single-node demos and tests.
#[derive(Debug, Clone)]
pub struct StaticClusterClient {
    pods: u64,
    nodes: u64,
}

impl StaticClusterClient {
    pub fn new(pods: u64, nodes: u64) -> Self {
        Self { pods, nodes }
    }
}

#[async_trait]
impl ClusterClient for StaticClusterClient {
    async fn pod_count(&self, _namespace: &str) -> Result<u64> {
        Ok(self.pods)
    }

    async fn node_count(&self) -> Result<u64> {
        Ok(self.nodes)
    }
}

/// Configuration for the sampler loop.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Sampling interval (default: 30 seconds)
    pub interval: Duration,
    /// Namespace whose pods are counted
    pub namespace: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            namespace: "default".to_string(),
        }
    }
}

/// Background loop that records one resource sample per interval tick.
pub struct SamplerLoop {
    aggregator: Arc<TelemetryAggregator>,
    cluster: Arc<dyn ClusterClient>,
    config: SamplerConfig,
    metrics: ServiceMetrics,
    system: System,
}

impl SamplerLoop {
    pub fn new(
        aggregator: Arc<TelemetryAggregator>,
        cluster: Arc<dyn ClusterClient>,
        config: SamplerConfig,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            aggregator,
            cluster,
            config,
            metrics,
            system: System::new(),
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            namespace = %self.config.namespace,
            "Starting resource sampler loop"
        );

        let mut ticker = interval(self.config.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sample = self.collect_sample().await;
                    debug!(
                        cpu_usage = ?sample.cpu_usage,
                        memory_usage = ?sample.memory_usage,
                        pod_count = ?sample.pod_count,
                        node_count = ?sample.node_count,
                        "Sampler cycle complete"
                    );

                    self.aggregator.record_resource_metric(sample);
                    self.metrics.inc_sampler_cycles();
                    self.metrics.inc_records_ingested("resource");

                    let (access, scaling, resource) = self.aggregator.buffer_sizes();
                    self.metrics.set_buffer_entries(access, scaling, resource);
                }
                _ = shutdown.recv() => {
                    info!("Shutting down resource sampler loop");
                    break;
                }
            }
        }
    }

    async fn collect_sample(&mut self) -> ResourceSample {
        let (cpu_usage, memory_usage) = self.sample_host();

        let pod_count = match self.cluster.pod_count(&self.config.namespace).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to query pod count");
                self.metrics.inc_sampler_errors();
                None
            }
        };

        let node_count = match self.cluster.node_count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to query node count");
                self.metrics.inc_sampler_errors();
                None
            }
        };

        ResourceSample {
            cpu_usage,
            memory_usage,
            pod_count,
            node_count,
            ..Default::default()
        }
    }

    /// Host CPU/memory utilization percentages.
    fn sample_host(&mut self) -> (Option<f64>, Option<f64>) {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let cpu = round2(f64::from(self.system.global_cpu_info().cpu_usage()));

        let total = self.system.total_memory();
        let memory = if total > 0 {
            Some(round2(self.system.used_memory() as f64 / total as f64 * 100.0))
        } else {
            None
        };

        (Some(cpu), memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FailingClusterClient;

    #[async_trait]
    impl ClusterClient for FailingClusterClient {
        async fn pod_count(&self, _namespace: &str) -> Result<u64> {
            Err(anyhow!("connection refused"))
        }

        async fn node_count(&self) -> Result<u64> {
            Err(anyhow!("connection refused"))
        }
    }

    fn sampler(cluster: Arc<dyn ClusterClient>, interval: Duration) -> SamplerLoop {
        SamplerLoop::new(
            Arc::new(TelemetryAggregator::new()),
            cluster,
            SamplerConfig {
                interval,
                namespace: "default".to_string(),
            },
            ServiceMetrics::new(),
        )
    }

    #[tokio::test]
    async fn sampler_records_samples_until_shutdown() {
        let aggregator = Arc::new(TelemetryAggregator::new());
        let sampler = SamplerLoop::new(
            Arc::clone(&aggregator),
            Arc::new(StaticClusterClient::new(3, 2)),
            SamplerConfig {
                interval: Duration::from_millis(10),
                namespace: "default".to_string(),
            },
            ServiceMetrics::new(),
        );

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(sampler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        let trends = aggregator.get_resource_trends(1);
        assert!(trends.data_points >= 1);
        assert_eq!(trends.pod_count_trend[0].value, 3.0);
        assert_eq!(trends.node_count_trend[0].value, 2.0);
    }

    #[tokio::test]
    async fn cluster_failure_degrades_sample_instead_of_skipping() {
        let mut sampler = sampler(Arc::new(FailingClusterClient), Duration::from_secs(1));
        let sample = sampler.collect_sample().await;

        assert!(sample.pod_count.is_none());
        assert!(sample.node_count.is_none());
        assert!(sample.cpu_usage.is_some());
    }

    #[tokio::test]
    async fn static_client_answers_configured_counts() {
        let client = StaticClusterClient::new(7, 4);
        assert_eq!(client.pod_count("default").await.unwrap(), 7);
        assert_eq!(client.node_count().await.unwrap(), 4);
    }
}
