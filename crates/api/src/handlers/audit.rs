//! Handlers for the per-draft audit trail.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use draftsync_core::types::DbId;
use draftsync_db::models::audit::AuditQuery;
use draftsync_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::handlers::ensure_draft;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/drafts/{id}/audit
///
/// Newest first; optional `action_type`, `limit`, `offset`.
pub async fn list_for_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DbId>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    ensure_draft(&state, draft_id).await?;
    let entries = AuditLogRepo::list_for_draft(&state.pool, draft_id, &params).await?;
    Ok(Json(DataResponse { data: entries }))
}
