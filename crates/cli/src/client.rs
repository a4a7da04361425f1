//! API client for communicating with the scalewatch service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use telemetry_lib::models::{AccessStats, ResourceTrends, ScalingEvent, ScalingStats, TimeRange};
use telemetry_lib::StressTest;
use url::Url;

/// API client for the scalewatch HTTP service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub events: Vec<ScalingEvent>,
    pub time_range: TimeRange,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsResponse {
    pub success: bool,
    pub trends: ResourceTrends,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingStatsResponse {
    pub success: bool,
    pub statistics: ScalingStats,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStatsResponse {
    pub success: bool,
    pub statistics: AccessStats,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEventRequest {
    pub event_type: String,
    pub trigger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEventResponse {
    pub success: bool,
    pub message: String,
    pub event_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressStartRequest {
    pub duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mb: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressStopResponse {
    pub success: bool,
    pub message: String,
    pub test_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressListResponse {
    pub active: Vec<StressTest>,
    pub history: Vec<StressTest>,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_parses_a_history_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/scaling/history?hours=24")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "count": 1,
                    "events": [{"event_id": "scale_x", "event_type": "pod_scale_up", "trigger": "hpa"}],
                    "time_range": {"start": "2026-08-30T00:00:00.000000Z", "end": "2026-08-31T00:00:00.000000Z", "hours": 24},
                    "timestamp": "2026-08-31T00:00:00.000000Z",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response: HistoryResponse = client.get("/scaling/history?hours=24").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.count, 1);
        assert_eq!(response.events[0].event_id.as_deref(), Some("scale_x"));
        assert_eq!(response.time_range.hours, 24);
    }

    #[tokio::test]
    async fn post_sends_json_and_parses_the_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/scaling/record-event")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "message": "Scaling event recorded",
                    "event_id": "scale_20260831_000000_000001",
                    "timestamp": "2026-08-31T00:00:00.000000Z",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let request = RecordEventRequest {
            event_type: "pod_scale_up".to_string(),
            trigger: "hpa_cpu".to_string(),
            status: None,
        };
        let response: RecordEventResponse = client
            .post("/scaling/record-event", &request)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert!(response.event_id.starts_with("scale_"));
    }

    #[tokio::test]
    async fn non_success_status_surfaces_the_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/scaling/history")
            .with_status(503)
            .with_body(r#"{"error": true, "error_type": "service_unavailable"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result: Result<HistoryResponse> = client.get("/scaling/history").await;

        let error = result.unwrap_err().to_string();
        assert!(error.contains("503"));
        assert!(error.contains("service_unavailable"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
