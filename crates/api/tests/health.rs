//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");
    assert_eq!(json["deploy_mode"], "draft");
    assert!(json["version"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn health_is_also_served_under_api_prefix(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
