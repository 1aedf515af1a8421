//! Draft version entity model and DTOs.

use draftsync_core::payload::{AiModal, VersionBlock};
use draftsync_core::status::{DraftStatus, SyncStatus};
use draftsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `draft_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DraftVersion {
    pub id: DbId,
    pub app_version_name: String,
    pub location_name: String,
    pub feishu_field_names: String,
    pub ai_modal: String,
    pub status: i32,
    // -- Submission aggregate --
    pub draft_status: String,
    pub submit_version: i32,
    pub last_submit_by: Option<DbId>,
    pub last_submit_at: Option<Timestamp>,
    pub confirmed_by: Option<DbId>,
    pub confirmed_at: Option<Timestamp>,
    // -- Sync aggregate --
    pub sync_status: String,
    pub sync_message: Option<String>,
    pub synced_at: Option<Timestamp>,
    pub target_id: Option<DbId>,
    // -- Timestamps --
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DraftVersion {
    pub fn draft_status(&self) -> Option<DraftStatus> {
        DraftStatus::parse(&self.draft_status)
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        SyncStatus::parse(&self.sync_status)
    }

    /// The identity block sent to and received from production.
    pub fn version_block(&self) -> VersionBlock {
        VersionBlock {
            app_version_name: self.app_version_name.clone(),
            location_name: self.location_name.clone(),
            feishu_field_names: self.feishu_field_names.clone(),
            ai_modal: AiModal::parse(&self.ai_modal).unwrap_or_default(),
            status: self.status,
        }
    }
}

/// DTO for creating a draft version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraftVersion {
    pub app_version_name: String,
    pub location_name: Option<String>,
    pub feishu_field_names: Option<String>,
    pub ai_modal: Option<AiModal>,
    pub status: Option<i32>,
}

impl From<&VersionBlock> for CreateDraftVersion {
    fn from(block: &VersionBlock) -> Self {
        Self {
            app_version_name: block.app_version_name.clone(),
            location_name: Some(block.location_name.clone()),
            feishu_field_names: Some(block.feishu_field_names.clone()),
            ai_modal: Some(block.ai_modal),
            status: Some(block.status),
        }
    }
}
