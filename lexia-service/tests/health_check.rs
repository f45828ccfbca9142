//! Health and metrics endpoint tests.
//!
//! Tests touching PostgreSQL are `#[ignore]`d; run them with a local
//! database and `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::*;
use tower::ServiceExt;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn health_check_returns_ok() {
    let app = spawn_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "lexia-service");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn readiness_check_returns_ok() {
    let app = spawn_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_check_degrades_without_database() {
    let router = build_offline_router(true);

    let response = router.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(response).await;
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn metrics_endpoint_renders_exposition() {
    let router = build_offline_router(true);

    let response = router.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
