//! Route definitions for the `/drafts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{audit, submissions, sync};
use crate::state::AppState;

/// Routes mounted at `/drafts`.
///
/// ```text
/// POST   /{id}/submissions    -> submit
/// GET    /{id}/submissions    -> list_for_draft  (?module, table_name, entity_id, limit, offset)
/// POST   /{id}/sync           -> sync_draft
/// GET    /{id}/sync-jobs      -> list_sync_jobs  (?limit)
/// GET    /{id}/audit          -> audit list      (?action_type, limit, offset)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/submissions",
            post(submissions::submit).get(submissions::list_for_draft),
        )
        .route("/{id}/sync", post(sync::sync_draft))
        .route("/{id}/sync-jobs", get(sync::list_sync_jobs))
        .route("/{id}/audit", get(audit::list_for_draft))
}
