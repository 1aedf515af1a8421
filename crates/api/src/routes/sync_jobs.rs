//! Route definitions for the `/sync-jobs` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Routes mounted at `/sync-jobs`.
///
/// ```text
/// GET    /{id}    -> get_sync_job (job + module jobs)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(sync::get_sync_job))
}
