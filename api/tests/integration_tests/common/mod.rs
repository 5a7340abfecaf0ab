//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup, scripted providers and HTTP request helpers.

use api::{create_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shared::chrono::Utc;
use shared::models::DataSource;
use shared::publish::Publisher;
use shared::refresh::RefreshOrchestrator;
use shared::sources::{Indicator, SourceError, StatisticsSource};
use shared::storage::{DemographicStore, FetchCache};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A provider answering from a fixed table.
pub struct ScriptedSource {
    name: &'static str,
    tier: DataSource,
    values: HashMap<Indicator, f64>,
}

impl ScriptedSource {
    /// A primary-tier provider with the given answers.
    pub fn primary(values: &[(Indicator, f64)]) -> Arc<dyn StatisticsSource> {
        Arc::new(Self {
            name: "World Bank",
            tier: DataSource::Primary,
            values: values.iter().copied().collect(),
        })
    }

    /// A fallback-tier provider with the given answers.
    pub fn fallback(values: &[(Indicator, f64)]) -> Arc<dyn StatisticsSource> {
        Arc::new(Self {
            name: "Eurostat",
            tier: DataSource::Fallback,
            values: values.iter().copied().collect(),
        })
    }
}

#[async_trait]
impl StatisticsSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    fn tier(&self) -> DataSource {
        self.tier
    }

    fn supports(&self, indicator: Indicator) -> bool {
        match self.tier {
            DataSource::Primary => indicator != Indicator::AnnualBirths,
            _ => matches!(
                indicator,
                Indicator::PopulationOver65 | Indicator::AnnualBirths
            ),
        }
    }

    async fn fetch(&self, indicator: Indicator) -> Result<f64, SourceError> {
        self.values
            .get(&indicator)
            .copied()
            .ok_or(SourceError::Empty)
    }
}

/// The scripted World Bank answers used across tests.
pub fn uk_primary() -> Arc<dyn StatisticsSource> {
    ScriptedSource::primary(&[
        (Indicator::PopulationOver65, 12_000_000.0),
        (Indicator::TotalPopulation, 67_000_000.0),
        (Indicator::CrudeBirthRate, 10.5),
    ])
}

/// A fully wired test application.
pub struct TestApp {
    /// The router under test.
    pub router: Router,
    /// The state handed to the router.
    pub state: AppState,
    /// The publisher shared with the orchestrator.
    pub publisher: Arc<Publisher>,
    /// The orchestrator, driven manually by tests.
    pub orchestrator: RefreshOrchestrator,
}

/// Creates a test app whose orchestrator uses `tiers`.
pub fn test_app_with(tiers: Vec<Arc<dyn StatisticsSource>>) -> TestApp {
    let store = DemographicStore::new(Utc::now());
    let cache = FetchCache::new();
    let publisher = Arc::new(Publisher::new(store.reader()));
    let names = tiers.iter().map(|t| t.name().to_string()).collect();
    let state = AppState::new(Arc::clone(&publisher), cache.reader(), names)
        .with_environment("test");
    let orchestrator = RefreshOrchestrator::new(store, cache, Arc::clone(&publisher), tiers);
    let router = create_router(state.clone());

    TestApp {
        router,
        state,
        publisher,
        orchestrator,
    }
}

/// Creates a test app backed by the scripted UK primary provider.
pub fn test_app() -> TestApp {
    test_app_with(vec![uk_primary()])
}

/// Serves `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Helper to make a GET request.
///
/// # Arguments
///
/// * `app` - The Axum router to send the request to
/// * `uri` - The URI path to GET from
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}
