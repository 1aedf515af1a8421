//! Submit and confirm.
//!
//! Every submit appends an immutable snapshot keyed by
//! `(draft, module, table, entity, version)`. A submit by someone other than
//! the previous submitter of the same key needs confirmation before the draft
//! counts as confirmed again.

use draftsync_core::audit::{action_types, entity_types};
use draftsync_core::diff::{compute_diff, DiffItem};
use draftsync_core::error::CoreError;
use draftsync_core::module::SyncModule;
use draftsync_core::status::{DraftStatus, SubmissionStatus, TaskStatus};
use draftsync_core::types::DbId;
use draftsync_db::models::audit::CreateAuditLog;
use draftsync_db::models::submission::CreateSubmission;
use draftsync_db::repositories::{AuditLogRepo, DraftVersionRepo, SubmissionRepo, TaskRepo};
use draftsync_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Body of `POST /drafts/{id}/submissions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitInput {
    pub module: String,
    pub table_name: String,
    pub entity_id: DbId,
    pub submitter_id: DbId,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub submission_id: DbId,
    pub version: i32,
    pub need_confirm: bool,
    pub status: SubmissionStatus,
    pub diff: Vec<DiffItem>,
}

/// Body of `POST /submissions/{id}/confirm`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmInput {
    pub confirmed_by: DbId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResult {
    pub submission_id: DbId,
    pub status: SubmissionStatus,
    pub draft_status: DraftStatus,
}

pub struct SubmissionEngine {
    pool: DbPool,
}

impl SubmissionEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a new submission for one entity of a draft.
    ///
    /// Lock order is draft row, then the prior submission of the key; confirm
    /// takes the same order.
    pub async fn submit(&self, draft_id: DbId, input: &SubmitInput) -> AppResult<SubmitResult> {
        let Some(payload) = input.payload.as_object() else {
            return Err(CoreError::Validation("payload must be a JSON object".into()).into());
        };
        let module = SyncModule::parse(&input.module).ok_or_else(|| {
            CoreError::Validation(format!("unknown module '{}'", input.module))
        })?;
        let table_name = input.table_name.trim();
        if table_name.is_empty() {
            return Err(CoreError::Validation("table_name must not be empty".into()).into());
        }

        let mut tx = self.pool.begin().await?;

        DraftVersionRepo::find_for_update(&mut *tx, draft_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "DraftVersion",
                id: draft_id,
            })?;

        let prior = SubmissionRepo::latest_for_key_for_update(
            &mut *tx,
            draft_id,
            module.as_str(),
            table_name,
            input.entity_id,
        )
        .await?;

        let (version, previous_payload) = match &prior {
            Some(prev) => (prev.version + 1, prev.payload_object()),
            None => (1, serde_json::Map::new()),
        };
        let diff = compute_diff(&previous_payload, payload);
        let need_confirm = prior
            .as_ref()
            .is_some_and(|prev| prev.submitter_id != input.submitter_id);
        let status = if need_confirm {
            SubmissionStatus::PendingConfirm
        } else {
            SubmissionStatus::Submitted
        };

        let submission = SubmissionRepo::insert(
            &mut *tx,
            &CreateSubmission {
                draft_version_id: draft_id,
                module: module.as_str().to_string(),
                table_name: table_name.to_string(),
                entity_id: input.entity_id,
                version,
                submitter_id: input.submitter_id,
                payload: input.payload.clone(),
                diff: diff.clone(),
                need_confirm,
                status,
                prev_submission_id: prior.as_ref().map(|p| p.id),
            },
        )
        .await?;

        SubmissionRepo::insert_field_histories(&mut *tx, &submission, &diff).await?;
        TaskRepo::set_status_for_module(&mut *tx, draft_id, module.as_str(), TaskStatus::from(status))
            .await?;
        DraftVersionRepo::record_submit(&mut *tx, draft_id, input.submitter_id, DraftStatus::from(status))
            .await?;

        let changed: Vec<&str> = diff.iter().map(|d| d.field.as_str()).collect();
        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog {
                draft_version_id: Some(draft_id),
                actor_id: Some(input.submitter_id),
                action_type: action_types::SUBMIT,
                entity_type: Some(entity_types::SUBMISSION),
                entity_id: Some(submission.id),
                details_json: Some(serde_json::json!({
                    "module": module.as_str(),
                    "table_name": table_name,
                    "entity_id": input.entity_id,
                    "version": version,
                    "need_confirm": need_confirm,
                    "changed_fields": changed,
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            draft_id,
            submission_id = submission.id,
            module = %module,
            entity_id = input.entity_id,
            version,
            need_confirm,
            changed = diff.len(),
            "Submission recorded",
        );

        Ok(SubmitResult {
            submission_id: submission.id,
            version,
            need_confirm,
            status,
            diff,
        })
    }

    /// Confirm a submission. Confirming an already-confirmed submission
    /// returns the current state without writing.
    pub async fn confirm(&self, submission_id: DbId, confirmed_by: DbId) -> AppResult<ConfirmResult> {
        let not_found = || CoreError::NotFound {
            entity: "Submission",
            id: submission_id,
        };

        let draft_id = SubmissionRepo::find_by_id(&self.pool, submission_id)
            .await?
            .ok_or_else(not_found)?
            .draft_version_id;

        let mut tx = self.pool.begin().await?;

        let draft = DraftVersionRepo::find_for_update(&mut *tx, draft_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "DraftVersion",
                id: draft_id,
            })?;
        let submission = SubmissionRepo::find_for_update(&mut *tx, submission_id)
            .await?
            .ok_or_else(not_found)?;

        let current_draft_status = draft.draft_status().unwrap_or(DraftStatus::Draft);

        if submission.status() == Some(SubmissionStatus::Confirmed) {
            tx.rollback().await?;
            tracing::debug!(submission_id, "Submission already confirmed");
            return Ok(ConfirmResult {
                submission_id,
                status: SubmissionStatus::Confirmed,
                draft_status: current_draft_status,
            });
        }

        SubmissionRepo::mark_confirmed(&mut *tx, submission_id, confirmed_by).await?;
        let module_pending =
            SubmissionRepo::count_pending_for_module(&mut *tx, draft_id, &submission.module).await?;
        if module_pending == 0 {
            TaskRepo::set_status_for_module(&mut *tx, draft_id, &submission.module, TaskStatus::Confirmed)
                .await?;
        }

        let remaining = SubmissionRepo::count_pending(&mut *tx, draft_id).await?;
        let draft_status = if remaining == 0 {
            DraftVersionRepo::mark_confirmed(&mut *tx, draft_id, confirmed_by).await?;
            DraftStatus::Confirmed
        } else {
            current_draft_status
        };

        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog {
                draft_version_id: Some(draft_id),
                actor_id: Some(confirmed_by),
                action_type: action_types::CONFIRM,
                entity_type: Some(entity_types::SUBMISSION),
                entity_id: Some(submission_id),
                details_json: Some(serde_json::json!({
                    "module": submission.module,
                    "table_name": submission.table_name,
                    "entity_id": submission.entity_id,
                    "version": submission.version,
                    "remaining_pending": remaining,
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            draft_id,
            submission_id,
            confirmed_by,
            remaining_pending = remaining,
            draft_status = %draft_status,
            "Submission confirmed",
        );

        Ok(ConfirmResult {
            submission_id,
            status: SubmissionStatus::Confirmed,
            draft_status,
        })
    }
}
