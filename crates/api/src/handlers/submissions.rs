//! Handlers for submissions and their confirmation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use draftsync_core::error::CoreError;
use draftsync_core::types::DbId;
use draftsync_db::models::submission::SubmissionListQuery;
use draftsync_db::repositories::SubmissionRepo;

use crate::engine::submission::{ConfirmInput, SubmissionEngine, SubmitInput};
use crate::error::{AppError, AppResult};
use crate::handlers::ensure_draft;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/drafts/{id}/submissions
pub async fn submit(
    State(state): State<AppState>,
    Path(draft_id): Path<DbId>,
    Json(input): Json<SubmitInput>,
) -> AppResult<impl IntoResponse> {
    let result = SubmissionEngine::new(state.pool.clone())
        .submit(draft_id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// GET /api/v1/drafts/{id}/submissions
///
/// Newest first. Filters: `module`, `table_name`, `entity_id`; paged with
/// `limit` / `offset`.
pub async fn list_for_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DbId>,
    Query(params): Query<SubmissionListQuery>,
) -> AppResult<impl IntoResponse> {
    ensure_draft(&state, draft_id).await?;
    let submissions = SubmissionRepo::list_for_draft(&state.pool, draft_id, &params).await?;
    Ok(Json(DataResponse { data: submissions }))
}

/// GET /api/v1/submissions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let submission = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }))?;
    Ok(Json(DataResponse { data: submission }))
}

/// GET /api/v1/submissions/{id}/history
pub async fn field_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Submission",
            id,
        }))?;
    let history = SubmissionRepo::list_field_histories(&state.pool, id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// POST /api/v1/submissions/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ConfirmInput>,
) -> AppResult<impl IntoResponse> {
    let result = SubmissionEngine::new(state.pool.clone())
        .confirm(id, input.confirmed_by)
        .await?;
    Ok(Json(DataResponse { data: result }))
}
