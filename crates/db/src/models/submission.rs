//! Submission snapshots and the field history derived from them.
//!
//! Submissions are append-only: only `status`, `confirmed_by` and
//! `confirmed_at` change after insert, and only through Confirm.

use draftsync_core::diff::DiffItem;
use draftsync_core::status::SubmissionStatus;
use draftsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `draft_submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub module: String,
    pub table_name: String,
    pub entity_id: DbId,
    pub version: i32,
    pub submitter_id: DbId,
    pub payload: serde_json::Value,
    pub diff: serde_json::Value,
    pub need_confirm: bool,
    pub status: String,
    pub prev_submission_id: Option<DbId>,
    pub confirmed_by: Option<DbId>,
    pub confirmed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Submission {
    pub fn status(&self) -> Option<SubmissionStatus> {
        SubmissionStatus::parse(&self.status)
    }

    /// The top-level payload object. Non-object payloads never reach the
    /// table, so anything else reads as empty.
    pub fn payload_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.payload.as_object().cloned().unwrap_or_default()
    }
}

/// Insert DTO for a new submission row. Built by the submission engine,
/// never deserialized from a request.
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub draft_version_id: DbId,
    pub module: String,
    pub table_name: String,
    pub entity_id: DbId,
    pub version: i32,
    pub submitter_id: DbId,
    pub payload: serde_json::Value,
    pub diff: Vec<DiffItem>,
    pub need_confirm: bool,
    pub status: SubmissionStatus,
    pub prev_submission_id: Option<DbId>,
}

/// Optional filters for listing a draft's submissions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionListQuery {
    pub module: Option<String>,
    pub table_name: Option<String>,
    pub entity_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A row from the `draft_field_histories` table.
///
/// `None` on either side means the key was absent there; a present JSON
/// `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FieldHistory {
    pub id: DbId,
    pub submission_id: DbId,
    pub draft_version_id: DbId,
    pub module: String,
    pub table_name: String,
    pub entity_id: DbId,
    pub field: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub changed_by: DbId,
    pub created_at: Timestamp,
}
