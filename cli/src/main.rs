//! Popstream CLI
//!
//! Command-line client for a running Popstream server.
//!
//! # Usage
//!
//! ```bash
//! popstream --help
//! popstream health
//! popstream demographics
//! popstream watch
//! ```

#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::Value;
use shared::models::{DemographicState, MetricSnapshot};
use shared::publish::UpdateEvent;
use tokio_tungstenite::tungstenite::Message;

/// Popstream CLI - live demographics from the command line
#[derive(Parser)]
#[command(name = "popstream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API server URL
    #[arg(
        short,
        long,
        env = "POPSTREAM_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API server health
    Health,
    /// Show refresh status and data sources
    Status,
    /// Show the current demographic figures
    Demographics,
    /// Stream updates until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let base = cli.api_url.trim_end_matches('/');

    match cli.command {
        Some(Commands::Health) => {
            let health = get_json(&format!("{base}/health")).await?;
            println!(
                "{} (up {:.0}s, data: {})",
                health["status"].as_str().unwrap_or("unknown"),
                health["uptime"].as_f64().unwrap_or_default(),
                health["dataSource"].as_str().unwrap_or("unknown"),
            );
        }
        Some(Commands::Status) => {
            let status = get_json(&format!("{base}/api/status")).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Some(Commands::Demographics) => {
            let body = get_json(&format!("{base}/api/demographics")).await?;
            let state: DemographicState =
                serde_json::from_value(body).context("unexpected demographics payload")?;
            print_state(&state);
        }
        Some(Commands::Watch) => watch(&websocket_url(base)?).await?,
        None => {
            println!("Popstream CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

async fn get_json(url: &str) -> Result<Value> {
    tracing::debug!(%url, "GET");
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to reach {url}"))?
        .error_for_status()?;
    Ok(response.json().await?)
}

/// Maps the HTTP API URL to the WebSocket endpoint.
fn websocket_url(base: &str) -> Result<String> {
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{rest}/ws"))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{rest}/ws"))
    } else {
        bail!("API URL must start with http:// or https://, got {base}")
    }
}

async fn watch(url: &str) -> Result<()> {
    let (mut stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    println!("Connected to {url}, waiting for updates (Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<UpdateEvent>(&text) {
                        Ok(update) => {
                            println!("--- {}", update.event);
                            print_state(&update.data);
                        }
                        Err(err) => tracing::warn!(error = %err, "Ignoring unexpected message"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    println!("Server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            },
        }
    }

    Ok(())
}

fn format_metric(label: &str, rate_label: &str, metric: &MetricSnapshot) -> String {
    format!(
        "{label:<18} {:>12}  {rate_label} {:>6}  [{}] {}",
        metric.count,
        metric.derived_rate,
        metric.source,
        metric.last_update.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn print_state(state: &DemographicState) {
    println!("{}", format_metric("Aged 65+", "per day", &state.over65));
    println!("{}", format_metric("Births per year", "per day", &state.births));
    println!("{}", format_metric("Total population", "per day", &state.total_population));
}
