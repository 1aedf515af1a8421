pub mod drafts;
pub mod health;
pub mod import;
pub mod submissions;
pub mod sync_jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                              liveness + version
///
/// /drafts/{id}/submissions             submit (POST), list (GET)
/// /drafts/{id}/sync                    push to production (POST)
/// /drafts/{id}/sync-jobs               sync job history (GET)
/// /drafts/{id}/audit                   audit trail (GET)
///
/// /submissions/{id}                    get
/// /submissions/{id}/history            field history
/// /submissions/{id}/confirm            confirm (POST)
///
/// /sync-jobs/{id}                      job + module jobs
///
/// /import                              import a production version (POST)
/// /import/versions                     production versions (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        // Submission trail and sync entry points, scoped by draft.
        .nest("/drafts", drafts::router())
        .nest("/submissions", submissions::router())
        .nest("/sync-jobs", sync_jobs::router())
        // Pull from production.
        .nest("/import", import::router())
}
