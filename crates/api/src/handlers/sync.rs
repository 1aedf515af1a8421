//! Handlers for pushing drafts to production and reading sync jobs.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use draftsync_core::error::CoreError;
use draftsync_core::types::DbId;
use draftsync_db::repositories::SyncJobRepo;
use serde::Deserialize;

use crate::engine::sync::{SyncOrchestrator, SyncRequest};
use crate::error::{AppError, AppResult};
use crate::handlers::ensure_draft;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncJobListParams {
    pub limit: Option<i64>,
}

/// POST /api/v1/drafts/{id}/sync
///
/// Validates, uploads local media, and pushes the draft. A version that
/// already exists in production answers 409 with `details.need_confirm`;
/// repeat the call with `confirm: true` to replace it.
pub async fn sync_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DbId>,
    Json(request): Json<SyncRequest>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(
        draft_id,
        trigger_by = request.trigger_by,
        confirm = request.confirm,
        modules = ?request.modules,
        "Sync requested",
    );
    let result = SyncOrchestrator::new(&state).sync(draft_id, &request).await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/drafts/{id}/sync-jobs
pub async fn list_sync_jobs(
    State(state): State<AppState>,
    Path(draft_id): Path<DbId>,
    Query(params): Query<SyncJobListParams>,
) -> AppResult<impl IntoResponse> {
    ensure_draft(&state, draft_id).await?;
    let jobs = SyncJobRepo::list_for_draft(&state.pool, draft_id, params.limit).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/sync-jobs/{id}
pub async fn get_sync_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let detail = SyncJobRepo::find_detail(&mut conn, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SyncJob",
            id,
        }))?;
    Ok(Json(DataResponse { data: detail }))
}
