//! Repository for the `draft_tasks` table.

use draftsync_core::status::TaskStatus;
use draftsync_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::task::{CreateDraftTask, DraftTask};

/// Column list for `draft_tasks` queries.
const COLUMNS: &str = "id, draft_version_id, module, assignee_id, status, created_at, updated_at";

/// Provides task assignment and status propagation.
pub struct TaskRepo;

impl TaskRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        input: &CreateDraftTask,
    ) -> Result<DraftTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO draft_tasks (draft_version_id, module, assignee_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DraftTask>(&query)
            .bind(draft_id)
            .bind(&input.module)
            .bind(input.assignee_id)
            .fetch_one(executor)
            .await
    }

    pub async fn list_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
    ) -> Result<Vec<DraftTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM draft_tasks WHERE draft_version_id = $1 ORDER BY module, id"
        );
        sqlx::query_as::<_, DraftTask>(&query)
            .bind(draft_id)
            .fetch_all(executor)
            .await
    }

    /// Move every task for `(draft, module)` to `status`. Returns the number
    /// of rows touched.
    pub async fn set_status_for_module(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        module: &str,
        status: TaskStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE draft_tasks SET status = $3 WHERE draft_version_id = $1 AND module = $2",
        )
        .bind(draft_id)
        .bind(module)
        .bind(status.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
