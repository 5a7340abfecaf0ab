//! Health check endpoint.
//!
//! Provides a simple health check endpoint for load balancers and monitoring systems.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use shared::chrono::{SecondsFormat, Utc};
use shared::models::DataSource;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Current server time, RFC 3339.
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
    /// Source of the headline metric.
    pub data_source: DataSource,
}

/// Creates the health check routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check handler.
///
/// Always answers; a degraded data source shows up in `dataSource`, not in
/// the status code.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime().as_secs_f64(),
        data_source: state.publisher().snapshot().headline_source(),
    })
}
