//! Draft row to production entity id mappings, written by import.

use draftsync_core::module::SyncModule;
use draftsync_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sync_id_mappings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyncIdMapping {
    pub id: DbId,
    pub draft_version_id: DbId,
    pub module: String,
    pub draft_row_id: DbId,
    pub remote_entity_id: DbId,
    pub created_at: Timestamp,
}

/// One mapping to record: a freshly inserted draft row and the remote
/// entity it was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewIdMapping {
    pub module: SyncModule,
    pub draft_row_id: DbId,
    pub remote_entity_id: DbId,
}
