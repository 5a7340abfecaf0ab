//! Point-in-time demographic reads.
//!
//! These handlers return whatever the last completed refresh cycle
//! published; they never wait on a refresh in progress.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use shared::models::{DemographicState, MetricKind, MetricSnapshot};

/// Creates the demographics routes.
pub fn demographics_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/demographics", get(all_metrics))
        .route("/api/over65", get(over65))
        .route("/api/births", get(births))
        .with_state(state)
}

async fn all_metrics(State(state): State<AppState>) -> Json<DemographicState> {
    Json(DemographicState::clone(&state.publisher().snapshot()))
}

async fn over65(State(state): State<AppState>) -> Json<MetricSnapshot> {
    Json(single(&state, MetricKind::Over65))
}

async fn births(State(state): State<AppState>) -> Json<MetricSnapshot> {
    Json(single(&state, MetricKind::Births))
}

fn single(state: &AppState, kind: MetricKind) -> MetricSnapshot {
    state.publisher().snapshot().get(kind).clone()
}
