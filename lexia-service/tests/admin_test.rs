//! Integration tests for admin auth and stats.
//!
//! Tests touching PostgreSQL are `#[ignore]`d; run them with a local
//! database and `cargo test -- --ignored`.

mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn login_with_wrong_key_is_rejected() {
    let router = build_offline_router(true);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/admin/auth",
            json!({ "accessKey": "wrong-key" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_http_only_session_cookie() {
    let router = build_offline_router(true);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/admin/auth",
            json!({ "accessKey": TEST_ADMIN_ACCESS_KEY }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie must be set")
        .to_string();
    assert!(raw_cookie.starts_with("admin_session="));
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("SameSite=Strict"));

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn stats_require_a_session_cookie() {
    let router = build_offline_router(true);

    let response = router
        .clone()
        .oneshot(get_request("/api/admin/stats/overview"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/admin/stats/analytics")
                .header(header::COOKIE, "admin_session=forged-token")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_expires_the_session_cookie() {
    let router = build_offline_router(true);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri("/api/admin/auth")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let removal = cookie_pair(&response, "admin_session").expect("removal cookie");
    assert_eq!(removal, "admin_session=");
}

async fn admin_cookie(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/auth",
            json!({ "accessKey": TEST_ADMIN_ACCESS_KEY }),
        ))
        .await
        .unwrap();
    cookie_pair(&response, "admin_session").expect("session cookie")
}

#[tokio::test]
async fn system_status_reports_service_flags() {
    let router = build_offline_router(true);
    let cookie = admin_cookie(&router).await;

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/admin/system/status")
                .header(header::COOKIE, cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["services"]["adminKey"], true);
    assert_eq!(body["services"]["database"], true);
    assert_eq!(body["env"], "dev");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn overview_reports_seeded_counts() {
    let app = spawn_test_app().await;
    let cookie = admin_cookie(&app.router).await;

    seed_conversation(
        &app.db,
        Some("user-1"),
        "session-a",
        "question dans la fenêtre",
        Utc::now() - Duration::hours(1),
    )
    .await;
    seed_conversation(
        &app.db,
        Some("user-1"),
        "session-b",
        "question hors fenêtre",
        Utc::now() - Duration::days(3),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/admin/stats/overview")
                .header(header::COOKIE, cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["totalConversations"], 2);
    assert_eq!(body["totalMessages"], 4);
    assert_eq!(body["conversationsToday"], 1);
    assert_eq!(body["recentActivity"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn analytics_counts_recent_sessions() {
    let app = spawn_test_app().await;
    let cookie = admin_cookie(&app.router).await;

    seed_conversation(
        &app.db,
        Some("user-1"),
        "session-recent",
        "question de la semaine",
        Utc::now() - Duration::days(2),
    )
    .await;
    seed_conversation(
        &app.db,
        Some("user-1"),
        "session-old",
        "question du mois dernier",
        Utc::now() - Duration::days(20),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/admin/stats/analytics")
                .header(header::COOKIE, cookie)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["totalConversations"], 2);
    assert_eq!(body["conversationsWeek"], 1);
    assert_eq!(body["userMessages"], 2);
    assert_eq!(body["topQuestions"].as_array().unwrap().len(), 2);
}
