//! Editorial task assignments per draft module.

use draftsync_core::status::TaskStatus;
use draftsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `draft_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftTask {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub module: String,
    pub assignee_id: Option<DbId>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DraftTask {
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }
}

/// DTO for assigning a module of a draft.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraftTask {
    pub module: String,
    pub assignee_id: Option<DbId>,
}
