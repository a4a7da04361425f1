//! Stress test commands

use anyhow::Result;
use tabled::Tabled;
use telemetry_lib::{StressKind, StressStatus, StressTest};

use crate::client::{ApiClient, StressListResponse, StressStartRequest, StressStopResponse};
use crate::output::{color_status, format_timestamp, print_success, print_warning, OutputFormat};

/// Row for the stress tests table
#[derive(Tabled)]
struct StressRow {
    #[tabled(rename = "Test ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Parameters")]
    parameters: String,
}

fn kind_label(kind: StressKind) -> &'static str {
    match kind {
        StressKind::Cpu => "cpu",
        StressKind::Memory => "memory",
    }
}

fn status_label(status: StressStatus) -> &'static str {
    match status {
        StressStatus::Running => "running",
        StressStatus::Stopped => "stopped",
        StressStatus::Completed => "completed",
        StressStatus::Failed => "failed",
    }
}

fn row(test: &StressTest) -> StressRow {
    let parameters = match (test.intensity, test.target_mb) {
        (Some(intensity), _) => format!("intensity {}%", intensity),
        (_, Some(target_mb)) => format!("{} MiB", target_mb),
        _ => "-".to_string(),
    };

    StressRow {
        id: test.test_id.clone(),
        kind: kind_label(test.test_type).to_string(),
        status: color_status(status_label(test.status)),
        started: format_timestamp(Some(&test.start_time)),
        duration: format!("{}s", test.duration_secs),
        parameters,
    }
}

fn print_tests(tests: &[StressTest]) {
    let rows: Vec<StressRow> = tests.iter().map(row).collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

fn print_started(test: StressTest, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&test)?);
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Started {} stress test {} for {}s",
                kind_label(test.test_type),
                test.test_id,
                test.duration_secs
            ));
        }
    }
    Ok(())
}

/// Start a CPU stress test
pub async fn start_cpu(
    client: &ApiClient,
    duration: u64,
    intensity: u8,
    format: OutputFormat,
) -> Result<()> {
    let request = StressStartRequest {
        duration_secs: duration,
        intensity: Some(intensity),
        target_mb: None,
    };

    let test: StressTest = client.post("stress/cpu/start", &request).await?;
    print_started(test, format)
}

/// Start a memory stress test
pub async fn start_memory(
    client: &ApiClient,
    duration: u64,
    target_mb: u64,
    format: OutputFormat,
) -> Result<()> {
    let request = StressStartRequest {
        duration_secs: duration,
        intensity: None,
        target_mb: Some(target_mb),
    };

    let test: StressTest = client.post("stress/memory/start", &request).await?;
    print_started(test, format)
}

/// Show the status of one stress test
pub async fn show_status(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let test: StressTest = client.get(&format!("stress/status/{}", id)).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&test)?);
        }
        OutputFormat::Table => {
            print_tests(std::slice::from_ref(&test));
            if let Some(error) = &test.error {
                print_warning(&format!("Error: {}", error));
            }
        }
    }

    Ok(())
}

/// Stop a running stress test
pub async fn stop(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let response: StressStopResponse = client
        .post(&format!("stress/stop/{}", id), &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            print_success(&format!("{} ({})", response.message, response.test_id));
        }
    }

    Ok(())
}

/// List active and recent stress tests
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: StressListResponse = client.get("stress/tests").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            if response.active.is_empty() && response.history.is_empty() {
                print_warning("No stress tests recorded");
                return Ok(());
            }

            if !response.active.is_empty() {
                println!("Active:");
                print_tests(&response.active);
            }
            if !response.history.is_empty() {
                println!("Recent:");
                print_tests(&response.history);
            }
        }
    }

    Ok(())
}
