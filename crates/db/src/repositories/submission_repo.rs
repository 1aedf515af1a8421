//! Repository for the `draft_submissions` and `draft_field_histories` tables.

use draftsync_core::diff::DiffItem;
use draftsync_core::status::SubmissionStatus;
use draftsync_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::submission::{CreateSubmission, FieldHistory, Submission, SubmissionListQuery};

/// Column list for `draft_submissions` queries.
const COLUMNS: &str = "\
    id, draft_version_id, module, table_name, entity_id, version, submitter_id, \
    payload, diff, need_confirm, status, prev_submission_id, \
    confirmed_by, confirmed_at, created_at";

/// Column list for `draft_field_histories` queries.
const HISTORY_COLUMNS: &str = "\
    id, submission_id, draft_version_id, module, table_name, entity_id, field, \
    old_value, new_value, changed_by, created_at";

/// Maximum page size for submission listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for submission listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides insert, lookup and confirm operations for submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Latest submission for a `(draft, module, table, entity)` key, locked
    /// `FOR UPDATE` so concurrent submits on the same key serialize.
    pub async fn latest_for_key_for_update(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        module: &str,
        table_name: &str,
        entity_id: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM draft_submissions \
             WHERE draft_version_id = $1 AND module = $2 AND table_name = $3 AND entity_id = $4 \
             ORDER BY version DESC \
             LIMIT 1 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(draft_id)
            .bind(module)
            .bind(table_name)
            .bind(entity_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &CreateSubmission,
    ) -> Result<Submission, sqlx::Error> {
        let diff = serde_json::to_value(&input.diff)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let query = format!(
            "INSERT INTO draft_submissions \
                 (draft_version_id, module, table_name, entity_id, version, submitter_id, \
                  payload, diff, need_confirm, status, prev_submission_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(input.draft_version_id)
            .bind(&input.module)
            .bind(&input.table_name)
            .bind(input.entity_id)
            .bind(input.version)
            .bind(input.submitter_id)
            .bind(&input.payload)
            .bind(diff)
            .bind(input.need_confirm)
            .bind(input.status.as_str())
            .bind(input.prev_submission_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM draft_submissions WHERE id = $1");
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM draft_submissions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Mark a submission confirmed. Returns `None` if it was already
    /// confirmed (or does not exist).
    pub async fn mark_confirmed(
        executor: impl PgExecutor<'_>,
        id: DbId,
        confirmed_by: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "UPDATE draft_submissions \
             SET status = $2, confirmed_by = $3, confirmed_at = NOW() \
             WHERE id = $1 AND status <> $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .bind(SubmissionStatus::Confirmed.as_str())
            .bind(confirmed_by)
            .fetch_optional(executor)
            .await
    }

    /// Number of submissions of a draft still waiting for confirmation.
    pub async fn count_pending(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM draft_submissions \
             WHERE draft_version_id = $1 AND status = $2",
        )
        .bind(draft_id)
        .bind(SubmissionStatus::PendingConfirm.as_str())
        .fetch_one(executor)
        .await
    }

    /// Pending submissions of one module of a draft.
    pub async fn count_pending_for_module(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        module: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM draft_submissions \
             WHERE draft_version_id = $1 AND module = $2 AND status = $3",
        )
        .bind(draft_id)
        .bind(module)
        .bind(SubmissionStatus::PendingConfirm.as_str())
        .fetch_one(executor)
        .await
    }

    /// List a draft's submissions, newest first, with optional key filters.
    pub async fn list_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        params: &SubmissionListQuery,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM draft_submissions \
             WHERE draft_version_id = $1 \
               AND ($2::TEXT IS NULL OR module = $2) \
               AND ($3::TEXT IS NULL OR table_name = $3) \
               AND ($4::BIGINT IS NULL OR entity_id = $4) \
             ORDER BY id DESC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(draft_id)
            .bind(&params.module)
            .bind(&params.table_name)
            .bind(params.entity_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Write one history row per diff entry of a submission.
    pub async fn insert_field_histories(
        conn: &mut PgConnection,
        submission: &Submission,
        diff: &[DiffItem],
    ) -> Result<(), sqlx::Error> {
        for item in diff {
            sqlx::query(
                "INSERT INTO draft_field_histories \
                     (submission_id, draft_version_id, module, table_name, entity_id, \
                      field, old_value, new_value, changed_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(submission.id)
            .bind(submission.draft_version_id)
            .bind(&submission.module)
            .bind(&submission.table_name)
            .bind(submission.entity_id)
            .bind(&item.field)
            .bind(&item.old)
            .bind(&item.new)
            .bind(submission.submitter_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn list_field_histories(
        executor: impl PgExecutor<'_>,
        submission_id: DbId,
    ) -> Result<Vec<FieldHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM draft_field_histories \
             WHERE submission_id = $1 ORDER BY field"
        );
        sqlx::query_as::<_, FieldHistory>(&query)
            .bind(submission_id)
            .fetch_all(executor)
            .await
    }
}
