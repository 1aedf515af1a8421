//! Sync job tracking models.

use draftsync_core::status::JobStatus;
use draftsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sync_jobs` table: one push attempt of a draft.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyncJob {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub trigger_by: DbId,
    pub confirm: bool,
    /// Resolved module keys, canonical order.
    pub modules: serde_json::Value,
    pub status: String,
    pub message: Option<String>,
    pub target_id: Option<DbId>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl SyncJob {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }
}

/// A row from the `sync_module_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyncModuleJob {
    pub id: DbId,
    pub sync_job_id: DbId,
    pub module: String,
    pub status: String,
    pub message: Option<String>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl SyncModuleJob {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }
}

/// A sync job with its per-module children.
#[derive(Debug, Clone, Serialize)]
pub struct SyncJobDetail {
    #[serde(flatten)]
    pub job: SyncJob,
    pub module_jobs: Vec<SyncModuleJob>,
}
