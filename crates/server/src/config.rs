//! Service configuration

use anyhow::Result;
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Pod name from the Kubernetes downward API
    #[serde(default = "default_pod_name")]
    pub pod_name: String,

    /// Node name from the Kubernetes downward API
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Namespace whose pods the sampler counts
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Resource sampling interval in seconds
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    /// Pod count reported by the static cluster client
    #[serde(default = "default_cluster_pods")]
    pub cluster_pods: u64,

    /// Node count reported by the static cluster client
    #[serde(default = "default_cluster_nodes")]
    pub cluster_nodes: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_pod_name() -> String {
    std::env::var("POD_NAME").unwrap_or_else(|_| "unknown-pod".to_string())
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown-node".to_string())
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_sample_interval() -> u64 {
    30
}

fn default_cluster_pods() -> u64 {
    1
}

fn default_cluster_nodes() -> u64 {
    1
}

impl ServiceConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCALEWATCH"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServiceConfig {
            port: default_port(),
            pod_name: default_pod_name(),
            node_name: default_node_name(),
            namespace: default_namespace(),
            sample_interval_secs: default_sample_interval(),
            cluster_pods: default_cluster_pods(),
            cluster_nodes: default_cluster_nodes(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ServiceConfig::load().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.sample_interval_secs, 30);
        assert_eq!(config.namespace, "default");
    }
}
