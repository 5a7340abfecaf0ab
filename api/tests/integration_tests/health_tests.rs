//! Integration tests for the health and status endpoints.
//!
//! Tests cover:
//! - Health check endpoint
//! - Status before and after the first refresh
//! - Source reporting after total provider failure

use axum::http::StatusCode;

use super::common::{get, test_app, test_app_with, ScriptedSource};

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let (status, response) = get(app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert!(response["timestamp"].is_string());
    assert!(response["uptime"].is_number());
}

#[tokio::test]
async fn test_status_before_first_refresh() {
    let app = test_app();

    let (status, response) = get(app.router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "online");
    assert!(response["lastDataUpdate"].is_null());
    assert_eq!(response["environment"], "test");
    assert_eq!(response["dataSources"], serde_json::json!(["World Bank"]));
    assert!(response["nextUpdate"].is_string());
}

#[tokio::test]
async fn test_status_after_refresh_reports_fetch_time() {
    let mut app = test_app();
    app.orchestrator.run_cycle().await;

    let (status, response) = get(app.router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["lastDataUpdate"].is_string());
    assert_eq!(response["dataSource"], "primary");
    assert!(app.state.fetch_cache().last_fetch().is_some());
}

#[tokio::test]
async fn test_total_failure_is_reported_as_synthetic_not_an_error() {
    let mut app = test_app_with(vec![
        ScriptedSource::primary(&[]),
        ScriptedSource::fallback(&[]),
    ]);
    app.orchestrator.run_cycle().await;

    let (status, response) = get(app.router.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["dataSource"], "synthetic");

    let (status, response) = get(app.router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["dataSource"], "synthetic");
    assert!(response["lastDataUpdate"].is_string());
}
