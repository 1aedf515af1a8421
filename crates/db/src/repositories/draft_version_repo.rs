//! Repository for the `draft_versions` table.
//!
//! Besides create/find, this owns every write to the two aggregates kept on
//! the version row: the submission aggregate (`draft_status`,
//! `submit_version`, submit/confirm stamps) and the sync aggregate
//! (`sync_status`, `sync_message`, `synced_at`, `target_id`).

use draftsync_core::payload::VersionBlock;
use draftsync_core::status::{DraftStatus, SyncStatus};
use draftsync_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::draft_version::{CreateDraftVersion, DraftVersion};

/// Column list for `draft_versions` queries.
const COLUMNS: &str = "\
    id, app_version_name, location_name, feishu_field_names, ai_modal, status, \
    draft_status, submit_version, last_submit_by, last_submit_at, \
    confirmed_by, confirmed_at, \
    sync_status, sync_message, synced_at, target_id, \
    created_at, updated_at";

/// Provides CRUD and aggregate updates for draft versions.
pub struct DraftVersionRepo;

impl DraftVersionRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateDraftVersion,
    ) -> Result<DraftVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO draft_versions \
                 (app_version_name, location_name, feishu_field_names, ai_modal, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(&input.app_version_name)
            .bind(input.location_name.as_deref().unwrap_or(""))
            .bind(input.feishu_field_names.as_deref().unwrap_or("[]"))
            .bind(input.ai_modal.unwrap_or_default().as_str())
            .bind(input.status.unwrap_or(0))
            .fetch_one(executor)
            .await
    }

    /// Create a draft from an imported version block, already marked synced
    /// against `target_id` (when the production id is known).
    pub async fn create_synced(
        executor: impl PgExecutor<'_>,
        block: &VersionBlock,
        target_id: Option<DbId>,
    ) -> Result<DraftVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO draft_versions \
                 (app_version_name, location_name, feishu_field_names, ai_modal, status, \
                  sync_status, synced_at, target_id) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(&block.app_version_name)
            .bind(&block.location_name)
            .bind(&block.feishu_field_names)
            .bind(block.ai_modal.as_str())
            .bind(block.status)
            .bind(SyncStatus::Synced.as_str())
            .bind(target_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<DraftVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM draft_versions WHERE id = $1");
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find and row-lock a draft for the rest of the transaction.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<DraftVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM draft_versions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Record a submission on the draft aggregate.
    pub async fn record_submit(
        executor: impl PgExecutor<'_>,
        id: DbId,
        submitter_id: DbId,
        status: DraftStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE draft_versions \
             SET last_submit_by = $2, last_submit_at = NOW(), \
                 submit_version = submit_version + 1, draft_status = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(submitter_id)
        .bind(status.as_str())
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn mark_confirmed(
        executor: impl PgExecutor<'_>,
        id: DbId,
        confirmed_by: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE draft_versions \
             SET draft_status = $2, confirmed_by = $3, confirmed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(DraftStatus::Confirmed.as_str())
        .bind(confirmed_by)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Set `sync_status` and `sync_message`, leaving the other sync fields.
    pub async fn set_sync_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: SyncStatus,
        message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE draft_versions SET sync_status = $2, sync_message = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(message)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// A push was accepted: store the production id and clear the message.
    pub async fn mark_synced(
        executor: impl PgExecutor<'_>,
        id: DbId,
        target_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE draft_versions \
             SET sync_status = $2, sync_message = NULL, synced_at = NOW(), target_id = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(SyncStatus::Synced.as_str())
        .bind(target_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// A push hit an existing production version and needs confirmation.
    pub async fn mark_pending_confirm(
        executor: impl PgExecutor<'_>,
        id: DbId,
        reason: &str,
        target_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE draft_versions \
             SET sync_status = $2, sync_message = $3, target_id = COALESCE($4, target_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(SyncStatus::PendingConfirm.as_str())
        .bind(reason)
        .bind(target_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Replace the identity block and sync metadata with an imported
    /// production version.
    pub async fn overwrite_identity(
        executor: impl PgExecutor<'_>,
        id: DbId,
        block: &VersionBlock,
        target_id: Option<DbId>,
    ) -> Result<DraftVersion, sqlx::Error> {
        let query = format!(
            "UPDATE draft_versions \
             SET app_version_name = $2, location_name = $3, feishu_field_names = $4, \
                 ai_modal = $5, status = $6, \
                 sync_status = $7, sync_message = NULL, synced_at = NOW(), target_id = $8 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(id)
            .bind(&block.app_version_name)
            .bind(&block.location_name)
            .bind(&block.feishu_field_names)
            .bind(block.ai_modal.as_str())
            .bind(block.status)
            .bind(SyncStatus::Synced.as_str())
            .bind(target_id)
            .fetch_one(executor)
            .await
    }
}
