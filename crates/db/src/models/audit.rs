//! Audit log entity model and DTOs.
//!
//! Audit rows are immutable records (no `updated_at`).

use draftsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub draft_version_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for inserting an audit entry. `details_json` is redacted on insert.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub draft_version_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action_type: &'static str,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
}

/// Filter parameters for a draft's audit trail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub action_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
