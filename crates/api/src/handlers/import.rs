//! Handlers for importing production versions into drafts.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::engine::import::{ImportEngine, ImportRequest};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/import/versions
pub async fn list_remote_versions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let versions = ImportEngine::new(&state).pull_versions().await?;
    Ok(Json(DataResponse { data: versions }))
}

/// POST /api/v1/import
///
/// Body: `{target_id | name, draft_id?, actor_id?}`. Without `draft_id` a
/// new draft is created; with it, that draft's content is replaced.
pub async fn import_from_online(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    let result = ImportEngine::new(&state).import(&request).await?;
    Ok(Json(DataResponse { data: result }))
}
