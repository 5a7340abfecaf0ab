//! Integration tests for the demographic read endpoints.
//!
//! Tests cover:
//! - Full state and single-metric reads
//! - Derived rates after a live refresh
//! - Fallback tagging when the primary provider is incomplete

use axum::http::StatusCode;
use shared::sources::Indicator;

use super::common::{get, test_app, test_app_with, ScriptedSource};

#[tokio::test]
async fn test_demographics_before_first_refresh() {
    let app = test_app();

    let (status, response) = get(app.router, "/api/demographics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["over65"]["count"], 0);
    assert_eq!(response["births"]["count"], 0);
    assert_eq!(response["totalPopulation"]["count"], 0);
    assert_eq!(response["over65"]["source"], "synthetic");
}

#[tokio::test]
async fn test_demographics_after_refresh() {
    let mut app = test_app();
    app.orchestrator.run_cycle().await;

    let (status, response) = get(app.router, "/api/demographics").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(response["over65"]["count"], 12_000_000);
    assert_eq!(response["over65"]["derivedRate"], 164);
    assert_eq!(response["over65"]["source"], "primary");
    assert_eq!(response["totalPopulation"]["count"], 67_000_000);
    assert_eq!(response["births"]["count"], 703_500);
    assert_eq!(response["births"]["derivedRate"], 1927);
    assert!(response["births"]["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_single_metric_endpoints() {
    let mut app = test_app();
    app.orchestrator.run_cycle().await;

    let (status, over65) = get(app.router.clone(), "/api/over65").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(over65["count"], 12_000_000);
    assert_eq!(over65["source"], "primary");

    let (status, births) = get(app.router, "/api/births").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(births["count"], 703_500);
    assert_eq!(births["derivedRate"], 1927);
}

#[tokio::test]
async fn test_births_from_fallback_when_primary_lacks_them() {
    let mut app = test_app_with(vec![
        ScriptedSource::primary(&[
            (Indicator::PopulationOver65, 12_000_000.0),
            (Indicator::TotalPopulation, 67_000_000.0),
        ]),
        ScriptedSource::fallback(&[
            (Indicator::PopulationOver65, 1.0),
            (Indicator::AnnualBirths, 680_000.0),
        ]),
    ]);
    app.orchestrator.run_cycle().await;

    let (_, response) = get(app.router, "/api/demographics").await;
    assert_eq!(response["over65"]["source"], "primary");
    assert_eq!(response["over65"]["count"], 12_000_000);
    assert_eq!(response["births"]["source"], "fallback");
    assert_eq!(response["births"]["count"], 680_000);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();

    let (status, _) = get(app.router, "/api/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
