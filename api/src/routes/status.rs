//! Service status endpoint.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use shared::chrono::{DateTime, Duration, Utc};
use shared::models::DataSource;

/// Status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Always "online" if reachable.
    pub status: &'static str,
    /// When providers were last queried, if ever.
    pub last_data_update: Option<DateTime<Utc>>,
    /// Source of the headline metric.
    pub data_source: DataSource,
    /// When the next refresh cycle is expected.
    pub next_update: DateTime<Utc>,
    /// Configured providers, in priority order.
    pub data_sources: Vec<String>,
    /// Deployment environment name.
    pub environment: String,
}

/// Creates the status routes.
pub fn status_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let interval = Duration::from_std(state.refresh_interval()).unwrap_or(Duration::zero());

    Json(StatusResponse {
        status: "online",
        last_data_update: state.fetch_cache().last_fetch(),
        data_source: state.publisher().snapshot().headline_source(),
        next_update: Utc::now() + interval,
        data_sources: state.data_sources().to_vec(),
        environment: state.environment().to_string(),
    })
}
