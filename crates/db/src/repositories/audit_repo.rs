//! Repository for the `audit_logs` table.

use draftsync_core::audit::redact_sensitive_fields;
use draftsync_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, draft_version_id, actor_id, action_type, entity_type, entity_id, \
    details_json, created_at";

/// Maximum page size for audit queries.
const MAX_LIMIT: i64 = 500;

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert one entry. Sensitive keys in `details_json` are redacted
    /// before the row is written.
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        entry: &CreateAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        let details = entry.details_json.as_ref().map(redact_sensitive_fields);
        let query = format!(
            "INSERT INTO audit_logs \
                 (draft_version_id, actor_id, action_type, entity_type, entity_id, details_json) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.draft_version_id)
            .bind(entry.actor_id)
            .bind(entry.action_type)
            .bind(entry.entity_type)
            .bind(entry.entity_id)
            .bind(details)
            .fetch_one(executor)
            .await
    }

    /// A draft's audit trail, newest first.
    pub async fn list_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
        params: &AuditQuery,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE draft_version_id = $1 AND ($2::TEXT IS NULL OR action_type = $2) \
             ORDER BY id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(draft_id)
            .bind(&params.action_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }
}
