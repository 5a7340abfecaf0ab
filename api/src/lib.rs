//! Popstream API Server
//!
//! This crate provides the HTTP server for the Popstream demographics service.
//! It runs the refresh loop that polls statistics providers and serves the
//! results over REST and a real-time WebSocket channel.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - REST endpoints for point-in-time reads (`/api/demographics`, `/api/status`, ...)
//! - A WebSocket channel (`/ws`) pushing every refresh cycle to connected clients
//! - A background refresh loop driven by [`shared::refresh::RefreshScheduler`]
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod routes;
mod state;

pub use config::Config;
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use shared::chrono::Utc;
use shared::publish::Publisher;
use shared::refresh::{RefreshOrchestrator, RefreshScheduler};
use shared::sources::{EurostatClient, StatisticsSource, WorldBankClient};
use shared::storage::{DemographicStore, FetchCache};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Name reported for the synthetic tier in `/api/status`.
const SYNTHETIC_SOURCE_NAME: &str = "Synthetic";

/// Runs the Popstream API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Popstream API server with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if:
/// - A provider client cannot be constructed
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = %config.environment,
        offline = config.offline,
        "Popstream API server starting"
    );

    let tiers = build_sources(&config)?;
    let mut data_sources: Vec<String> = tiers.iter().map(|t| t.name().to_string()).collect();
    data_sources.push(SYNTHETIC_SOURCE_NAME.to_string());

    let store = DemographicStore::new(Utc::now());
    let cache = FetchCache::new();
    let publisher = Arc::new(Publisher::new(store.reader()));
    let state = AppState::new(Arc::clone(&publisher), cache.reader(), data_sources)
        .with_environment(&config.environment)
        .with_refresh_interval(config.refresh_interval);

    let orchestrator = RefreshOrchestrator::new(store, cache, publisher, tiers)
        .with_threshold(config.refresh_threshold);
    let scheduler = RefreshScheduler::spawn(orchestrator, config.refresh_interval);

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Builds the provider tiers in priority order.
///
/// Offline mode has no tiers, so every live refresh falls through to
/// synthetic data.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built.
pub fn build_sources(config: &Config) -> Result<Vec<Arc<dyn StatisticsSource>>> {
    if config.offline {
        tracing::info!("Offline mode: serving synthetic data only");
        return Ok(Vec::new());
    }

    let primary = WorldBankClient::new(
        config.world_bank_url.clone(),
        config.country.clone(),
        config.source_timeout,
    )?;
    let fallback = EurostatClient::new(
        config.eurostat_url.clone(),
        config.geo.clone(),
        config.source_timeout,
    )?;

    let tiers: Vec<Arc<dyn StatisticsSource>> = vec![Arc::new(primary), Arc::new(fallback)];
    Ok(tiers)
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::demographics_routes(state.clone()))
        .merge(routes::status_routes(state.clone()))
        .merge(routes::realtime_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
