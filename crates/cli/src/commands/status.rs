//! Service health and readiness command

use anyhow::Result;
use telemetry_lib::{HealthResponse, ReadinessResponse};

use crate::client::ApiClient;
use crate::output::{color_status, print_info, print_warning, OutputFormat};

/// Show service health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    // An unhealthy service answers these with 503, which the client
    // surfaces as an error carrying the response body.
    let health: Result<HealthResponse> = client.get("healthz").await;
    let readiness: Result<ReadinessResponse> = client.get("readyz").await;

    match format {
        OutputFormat::Json => {
            let combined = serde_json::json!({
                "health": health.ok(),
                "readiness": readiness.ok(),
            });
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        OutputFormat::Table => {
            match health {
                Ok(health) => {
                    let status = serde_json::to_value(health.status)?;
                    print_info(&format!(
                        "Service: {}",
                        color_status(status.as_str().unwrap_or("unknown"))
                    ));
                    for (name, component) in &health.components {
                        let status = serde_json::to_value(component.status)?;
                        let mut line = format!(
                            "  {:<12} {}",
                            name,
                            color_status(status.as_str().unwrap_or("unknown"))
                        );
                        if let Some(message) = &component.message {
                            line.push_str(&format!(" ({})", message));
                        }
                        println!("{}", line);
                    }
                }
                Err(e) => print_warning(&format!("Health check failed: {}", e)),
            }

            match readiness {
                Ok(readiness) if readiness.ready => print_info("Ready: yes"),
                Ok(readiness) => print_warning(&format!(
                    "Ready: no ({})",
                    readiness.reason.unwrap_or_else(|| "unknown".to_string())
                )),
                Err(e) => print_warning(&format!("Readiness check failed: {}", e)),
            }
        }
    }

    Ok(())
}
