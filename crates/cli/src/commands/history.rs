//! Scaling history and statistics commands

use anyhow::Result;
use tabled::Tabled;
use telemetry_lib::models::EventStatus;

use crate::client::{
    AccessStatsResponse, ApiClient, HistoryResponse, RecordEventRequest, RecordEventResponse,
    ScalingStatsResponse, TrendsResponse,
};
use crate::output::{
    color_status, format_percent, format_timestamp, print_info, print_success, print_warning,
    OutputFormat,
};

/// Row for the scaling events table
#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Event ID")]
    id: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn status_label(status: Option<EventStatus>) -> String {
    match status {
        Some(EventStatus::Pending) => "pending",
        Some(EventStatus::InProgress) => "in_progress",
        Some(EventStatus::Completed) => "completed",
        Some(EventStatus::Failed) => "failed",
        Some(EventStatus::Unknown) => "unknown",
        None => "-",
    }
    .to_string()
}

/// List scaling events in the window
pub async fn show_events(client: &ApiClient, hours: u32, format: OutputFormat) -> Result<()> {
    let response: HistoryResponse = client
        .get(&format!("scaling/history?hours={}", hours))
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            if response.events.is_empty() {
                print_warning(&format!("No scaling events in the last {} hours", hours));
                return Ok(());
            }

            let rows: Vec<EventRow> = response
                .events
                .iter()
                .map(|e| EventRow {
                    time: format_timestamp(e.timestamp.as_deref()),
                    id: e.event_id.clone().unwrap_or_else(|| "-".to_string()),
                    event_type: e.event_type.clone().unwrap_or_else(|| "-".to_string()),
                    trigger: e.trigger.clone().unwrap_or_else(|| "-".to_string()),
                    status: color_status(&status_label(e.status)),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!(
                "\nTotal: {} events in the last {} hours",
                response.count, response.time_range.hours
            );
        }
    }

    Ok(())
}

/// Show resource utilization trends
pub async fn show_trends(client: &ApiClient, hours: u32, format: OutputFormat) -> Result<()> {
    let response: TrendsResponse = client
        .get(&format!("scaling/history/trends?hours={}", hours))
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            let trends = &response.trends;
            if trends.data_points == 0 {
                print_warning(&format!("No resource samples in the last {} hours", hours));
                return Ok(());
            }

            print_series("CPU usage", &trends.cpu_trend, "%");
            print_series("Memory usage", &trends.memory_trend, "%");
            print_series("Pod count", &trends.pod_count_trend, "");
            print_series("Node count", &trends.node_count_trend, "");
            println!(
                "\n{} samples between {} and {}",
                trends.data_points,
                format_timestamp(Some(&trends.time_range.start)),
                format_timestamp(Some(&trends.time_range.end)),
            );
        }
    }

    Ok(())
}

fn print_series(name: &str, points: &[telemetry_lib::models::TrendPoint], unit: &str) {
    match points.last() {
        Some(latest) => println!(
            "{:<13} {:>4} points, latest {:.2}{}",
            name,
            points.len(),
            latest.value,
            unit
        ),
        None => println!("{:<13} no data", name),
    }
}

/// Show scaling and access statistics
pub async fn show_stats(client: &ApiClient, hours: u32, format: OutputFormat) -> Result<()> {
    let scaling: ScalingStatsResponse = client
        .get(&format!("scaling/history/statistics?hours={}", hours))
        .await?;
    let access: AccessStatsResponse = client
        .get(&format!("access/stats?hours={}", hours))
        .await?;

    match format {
        OutputFormat::Json => {
            let combined = serde_json::json!({
                "scaling": scaling.statistics,
                "access": access.statistics,
            });
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        OutputFormat::Table => {
            let s = &scaling.statistics;
            print_info(&format!("Scaling (last {} hours)", hours));
            println!("  Events:       {}", s.total_events);
            println!("  Successful:   {}", s.successful_events);
            println!("  Failed:       {}", s.failed_events);
            println!("  Success rate: {}", format_percent(s.success_rate));
            println!("  Avg duration: {:.2}s", s.avg_response_time_seconds);
            for (event_type, count) in &s.event_type_distribution {
                println!("    {:<20} {}", event_type, count);
            }

            let a = &access.statistics;
            print_info(&format!("Access (last {} hours)", hours));
            println!("  Requests:     {}", a.total_requests);
            println!("  Unique IPs:   {}", a.unique_ips);
            println!("  Errors:       {}", a.error_count);
            println!("  Error rate:   {}", format_percent(a.error_rate));
            println!("  Avg latency:  {:.2}ms", a.avg_response_time_ms);
        }
    }

    Ok(())
}

/// Record an externally-observed scaling event
pub async fn record_event(
    client: &ApiClient,
    event_type: &str,
    trigger: &str,
    status: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let request = RecordEventRequest {
        event_type: event_type.to_string(),
        trigger: trigger.to_string(),
        status,
    };

    let response: RecordEventResponse = client.post("scaling/record-event", &request).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            print_success(&format!("{} ({})", response.message, response.event_id));
        }
    }

    Ok(())
}
