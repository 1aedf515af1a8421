//! Repository for the `sync_id_mappings` table.

use draftsync_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::sync_id_mapping::{NewIdMapping, SyncIdMapping};

/// Column list for `sync_id_mappings` queries.
const COLUMNS: &str = "id, draft_version_id, module, draft_row_id, remote_entity_id, created_at";

/// Provides writes and reads of draft/production id pairs.
pub struct SyncIdMappingRepo;

impl SyncIdMappingRepo {
    /// Record a batch of mappings for a draft. Re-recording a draft row
    /// replaces its remote id.
    pub async fn insert_many(
        conn: &mut PgConnection,
        draft_id: DbId,
        mappings: &[NewIdMapping],
    ) -> Result<u64, sqlx::Error> {
        let mut written = 0;
        for mapping in mappings {
            written += sqlx::query(
                "INSERT INTO sync_id_mappings \
                     (draft_version_id, module, draft_row_id, remote_entity_id) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT ON CONSTRAINT uq_sync_id_mappings_row \
                 DO UPDATE SET remote_entity_id = EXCLUDED.remote_entity_id",
            )
            .bind(draft_id)
            .bind(mapping.module.as_str())
            .bind(mapping.draft_row_id)
            .bind(mapping.remote_entity_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        }
        Ok(written)
    }

    pub async fn delete_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sync_id_mappings WHERE draft_version_id = $1")
            .bind(draft_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_draft(
        executor: impl PgExecutor<'_>,
        draft_id: DbId,
    ) -> Result<Vec<SyncIdMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sync_id_mappings WHERE draft_version_id = $1 \
             ORDER BY module, draft_row_id"
        );
        sqlx::query_as::<_, SyncIdMapping>(&query)
            .bind(draft_id)
            .fetch_all(executor)
            .await
    }
}
