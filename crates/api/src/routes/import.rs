//! Route definitions for the `/import` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST   /            -> import_from_online
/// GET    /versions    -> list_remote_versions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(import::import_from_online))
        .route("/versions", get(import::list_remote_versions))
}
