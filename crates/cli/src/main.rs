//! Scalewatch CLI
//!
//! A command-line tool for querying scaling history, recording events,
//! and driving stress tests against a scalewatch service.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{history, status, stress};

/// Scalewatch CLI
#[derive(Parser)]
#[command(name = "swctl")]
#[command(author, version, about = "CLI for the Scalewatch telemetry service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SCALEWATCH_API_URL env var)
    #[arg(long, env = "SCALEWATCH_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query scaling history and statistics
    #[command(subcommand)]
    History(HistoryCommands),

    /// Record an externally-observed scaling event
    RecordEvent {
        /// Event type (e.g. pod_scale_up, node_scale_down)
        #[arg(long)]
        event_type: String,

        /// What triggered the event (e.g. hpa_cpu, karpenter)
        #[arg(long)]
        trigger: String,

        /// Event status (pending, in_progress, completed, failed)
        #[arg(long)]
        status: Option<String>,
    },

    /// Start, inspect and stop stress tests
    #[command(subcommand)]
    Stress(StressCommands),

    /// Show service health and readiness
    Status,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List scaling events in the window
    Events {
        /// Look-back window in hours
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },

    /// Show resource utilization trends
    Trends {
        /// Look-back window in hours
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },

    /// Show scaling and access statistics
    Stats {
        /// Look-back window in hours
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
}

#[derive(Subcommand)]
pub enum StressCommands {
    /// Start a CPU stress test
    Cpu {
        /// Test duration in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,

        /// CPU duty cycle percentage (1-100)
        #[arg(long, default_value_t = 80)]
        intensity: u8,
    },

    /// Start a memory stress test
    Memory {
        /// Test duration in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,

        /// Memory to hold in MiB (10-500)
        #[arg(long, default_value_t = 100)]
        target_mb: u64,
    },

    /// Show the status of one stress test
    Status {
        /// Test ID
        id: String,
    },

    /// Stop a running stress test
    Stop {
        /// Test ID
        id: String,
    },

    /// List active and recent stress tests
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::History(history_cmd) => match history_cmd {
            HistoryCommands::Events { hours } => {
                history::show_events(&client, hours, cli.format).await?;
            }
            HistoryCommands::Trends { hours } => {
                history::show_trends(&client, hours, cli.format).await?;
            }
            HistoryCommands::Stats { hours } => {
                history::show_stats(&client, hours, cli.format).await?;
            }
        },
        Commands::RecordEvent {
            event_type,
            trigger,
            status,
        } => {
            history::record_event(&client, &event_type, &trigger, status, cli.format).await?;
        }
        Commands::Stress(stress_cmd) => match stress_cmd {
            StressCommands::Cpu {
                duration,
                intensity,
            } => {
                stress::start_cpu(&client, duration, intensity, cli.format).await?;
            }
            StressCommands::Memory {
                duration,
                target_mb,
            } => {
                stress::start_memory(&client, duration, target_mb, cli.format).await?;
            }
            StressCommands::Status { id } => {
                stress::show_status(&client, &id, cli.format).await?;
            }
            StressCommands::Stop { id } => {
                stress::stop(&client, &id, cli.format).await?;
            }
            StressCommands::List => {
                stress::list(&client, cli.format).await?;
            }
        },
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
