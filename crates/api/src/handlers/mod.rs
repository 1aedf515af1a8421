//! Request handlers for the draft workflow.
//!
//! Handlers parse the request, delegate to an engine in [`crate::engine`] or
//! to a repository in `draftsync_db`, and wrap results in
//! [`DataResponse`](crate::response::DataResponse).

pub mod audit;
pub mod import;
pub mod submissions;
pub mod sync;

use draftsync_core::error::CoreError;
use draftsync_core::types::DbId;
use draftsync_db::models::draft_version::DraftVersion;
use draftsync_db::repositories::DraftVersionRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Load a draft or fail with 404.
pub(crate) async fn ensure_draft(state: &AppState, draft_id: DbId) -> AppResult<DraftVersion> {
    DraftVersionRepo::find_by_id(&state.pool, draft_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DraftVersion",
            id: draft_id,
        }))
}
