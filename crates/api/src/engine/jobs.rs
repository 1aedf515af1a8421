//! Sync job bookkeeping.
//!
//! A sync attempt is one `sync_jobs` row plus one `sync_module_jobs` row per
//! resolved module. Rows are created `running` and moved to exactly one
//! terminal status; the repository guards every terminal update with
//! `WHERE status = 'running'`.

use draftsync_core::module::SyncModule;
use draftsync_core::status::JobStatus;
use draftsync_core::types::DbId;
use draftsync_db::repositories::SyncJobRepo;
use draftsync_db::DbPool;
use sqlx::PgConnection;

use crate::error::AppResult;

/// Message stored on jobs failed because a newer sync started.
pub const SUPERSEDED_MESSAGE: &str = "superseded by a newer sync";

/// An open job, returned by [`JobTracker::open`].
#[derive(Debug, Clone)]
pub struct SyncJobHandle {
    pub job_id: DbId,
    pub draft_id: DbId,
    pub modules: Vec<SyncModule>,
}

/// How a job ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success { target_id: DbId },
    Failed(String),
    PendingConfirm { reason: String, target_id: Option<DbId> },
}

impl JobOutcome {
    fn status(&self) -> JobStatus {
        match self {
            Self::Success { .. } => JobStatus::Success,
            Self::Failed(_) => JobStatus::Failed,
            Self::PendingConfirm { .. } => JobStatus::PendingConfirm,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failed(message) => Some(message),
            Self::PendingConfirm { reason, .. } => Some(reason),
        }
    }

    fn target_id(&self) -> Option<DbId> {
        match self {
            Self::Success { target_id } => Some(*target_id),
            Self::Failed(_) => None,
            Self::PendingConfirm { target_id, .. } => *target_id,
        }
    }
}

pub struct JobTracker {
    pool: DbPool,
}

impl JobTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fail every job of `draft_id` still marked running. Returns the ids of
    /// the superseded jobs.
    pub async fn supersede_stale(&self, draft_id: DbId) -> AppResult<Vec<DbId>> {
        let mut conn = self.pool.acquire().await?;
        let ids = SyncJobRepo::fail_running_for_draft(&mut conn, draft_id, SUPERSEDED_MESSAGE).await?;
        if !ids.is_empty() {
            tracing::warn!(draft_id, job_ids = ?ids, "Superseded stale sync jobs");
        }
        Ok(ids)
    }

    /// Supersede stale jobs and open a new one, atomically.
    pub async fn open(
        &self,
        draft_id: DbId,
        trigger_by: DbId,
        confirm: bool,
        modules: &[SyncModule],
    ) -> AppResult<SyncJobHandle> {
        let mut tx = self.pool.begin().await?;

        let stale = SyncJobRepo::fail_running_for_draft(&mut *tx, draft_id, SUPERSEDED_MESSAGE).await?;
        let detail =
            SyncJobRepo::create_with_modules(&mut *tx, draft_id, trigger_by, confirm, modules).await?;

        tx.commit().await?;

        if !stale.is_empty() {
            tracing::warn!(draft_id, job_ids = ?stale, "Superseded stale sync jobs");
        }
        tracing::info!(
            draft_id,
            job_id = detail.job.id,
            trigger_by,
            confirm,
            modules = detail.module_jobs.len(),
            "Sync job opened",
        );

        Ok(SyncJobHandle {
            job_id: detail.job.id,
            draft_id,
            modules: modules.to_vec(),
        })
    }

    /// Finish a job in its own transaction. See [`JobTracker::finish_with`].
    pub async fn finish(&self, handle: &SyncJobHandle, outcome: &JobOutcome) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::finish_with(&mut conn, handle, outcome).await
    }

    /// Move the job and its still-running module jobs to the outcome's
    /// status on `conn`, so callers can commit it together with other
    /// writes. Returns `false` (and changes nothing) if the job was already
    /// terminal.
    pub async fn finish_with(
        conn: &mut PgConnection,
        handle: &SyncJobHandle,
        outcome: &JobOutcome,
    ) -> AppResult<bool> {
        let status = outcome.status();
        let finished = SyncJobRepo::finish(
            conn,
            handle.job_id,
            status,
            outcome.message(),
            outcome.target_id(),
        )
        .await?;

        if finished {
            tracing::info!(
                job_id = handle.job_id,
                draft_id = handle.draft_id,
                status = %status,
                "Sync job finished",
            );
        } else {
            tracing::debug!(
                job_id = handle.job_id,
                status = %status,
                "Sync job already terminal; finish ignored",
            );
        }
        Ok(finished)
    }
}
