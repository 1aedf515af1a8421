//! Liveness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
    deploy_mode: &'static str,
}

/// GET /health
///
/// 200 while the database answers, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, database) = match draftsync_db::health_check(&state.pool).await {
        Ok(()) => ("ok", StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            deploy_mode: state.config.sync.deploy_mode.as_str(),
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
