//! Repository for the `sync_jobs` and `sync_module_jobs` tables.
//!
//! Every terminal transition is guarded by `WHERE status = 'running'`, so a
//! job reaches exactly one terminal state no matter how many callers race
//! to finish it.

use draftsync_core::module::SyncModule;
use draftsync_core::status::JobStatus;
use draftsync_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::sync_job::{SyncJob, SyncJobDetail, SyncModuleJob};

/// Column list for `sync_jobs` queries.
const COLUMNS: &str = "\
    id, draft_version_id, trigger_by, confirm, modules, status, message, \
    target_id, started_at, finished_at";

/// Column list for `sync_module_jobs` queries.
const MODULE_COLUMNS: &str = "\
    id, sync_job_id, module, status, message, started_at, finished_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Provides job creation, guarded finalization, and history reads.
pub struct SyncJobRepo;

impl SyncJobRepo {
    /// Insert a running parent job plus one running child per module.
    pub async fn create_with_modules(
        conn: &mut PgConnection,
        draft_id: DbId,
        trigger_by: DbId,
        confirm: bool,
        modules: &[SyncModule],
    ) -> Result<SyncJobDetail, sqlx::Error> {
        let keys: Vec<&str> = modules.iter().map(|m| m.as_str()).collect();
        let query = format!(
            "INSERT INTO sync_jobs (draft_version_id, trigger_by, confirm, modules, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, SyncJob>(&query)
            .bind(draft_id)
            .bind(trigger_by)
            .bind(confirm)
            .bind(serde_json::json!(keys))
            .bind(JobStatus::Running.as_str())
            .fetch_one(&mut *conn)
            .await?;

        let query = format!(
            "INSERT INTO sync_module_jobs (sync_job_id, module, status) \
             SELECT $1, m, $3 FROM UNNEST($2::TEXT[]) AS m \
             RETURNING {MODULE_COLUMNS}"
        );
        let module_jobs = sqlx::query_as::<_, SyncModuleJob>(&query)
            .bind(job.id)
            .bind(&keys)
            .bind(JobStatus::Running.as_str())
            .fetch_all(&mut *conn)
            .await?;

        Ok(SyncJobDetail { job, module_jobs })
    }

    /// Move a running job and its still-running children to a terminal
    /// status. Returns `false` if the job was no longer running.
    pub async fn finish(
        conn: &mut PgConnection,
        job_id: DbId,
        status: JobStatus,
        message: Option<&str>,
        target_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sync_jobs \
             SET status = $2, message = $3, target_id = COALESCE($4, target_id), \
                 finished_at = NOW() \
             WHERE id = $1 AND status = $5",
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(message)
        .bind(target_id)
        .bind(JobStatus::Running.as_str())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE sync_module_jobs \
             SET status = $2, message = $3, finished_at = NOW() \
             WHERE sync_job_id = $1 AND status = $4",
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(message)
        .bind(JobStatus::Running.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(true)
    }

    /// Fail every job of a draft still marked running, with its children.
    /// Returns the ids of the jobs that were superseded.
    pub async fn fail_running_for_draft(
        conn: &mut PgConnection,
        draft_id: DbId,
        message: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let ids: Vec<DbId> = sqlx::query_scalar(
            "UPDATE sync_jobs \
             SET status = $2, message = $3, finished_at = NOW() \
             WHERE draft_version_id = $1 AND status = $4 \
             RETURNING id",
        )
        .bind(draft_id)
        .bind(JobStatus::Failed.as_str())
        .bind(message)
        .bind(JobStatus::Running.as_str())
        .fetch_all(&mut *conn)
        .await?;

        if !ids.is_empty() {
            sqlx::query(
                "UPDATE sync_module_jobs \
                 SET status = $2, message = $3, finished_at = NOW() \
                 WHERE sync_job_id = ANY($1) AND status = $4",
            )
            .bind(&ids)
            .bind(JobStatus::Failed.as_str())
            .bind(message)
            .bind(JobStatus::Running.as_str())
            .execute(&mut *conn)
            .await?;
        }

        Ok(ids)
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<SyncJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sync_jobs WHERE id = $1");
        sqlx::query_as::<_, SyncJob>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// A job with its module jobs, or `None` if the job does not exist.
    pub async fn find_detail(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SyncJobDetail>, sqlx::Error> {
        let Some(job) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let module_jobs = Self::list_module_jobs(&mut *conn, id).await?;
        Ok(Some(SyncJobDetail { job, module_jobs }))
    }

    pub async fn list_module_jobs(
        executor: impl PgExecutor<'_>,
        job_id: DbId,
    ) -> Result<Vec<SyncModuleJob>, sqlx::Error> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM sync_module_jobs WHERE sync_job_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, SyncModuleJob>(&query)
            .bind(job_id)
            .fetch_all(executor)
            .await
    }

    /// A draft's jobs, newest first.
    pub async fn list_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<SyncJob>, sqlx::Error> {
        let limit = limit.unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM sync_jobs WHERE draft_version_id = $1 \
             ORDER BY id DESC LIMIT $2"
        );
        sqlx::query_as::<_, SyncJob>(&query)
            .bind(draft_id)
            .bind(limit)
            .fetch_all(executor)
            .await
    }
}
