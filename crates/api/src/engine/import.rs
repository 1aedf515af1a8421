//! Pull a production version back into a draft.
//!
//! Import either creates a new draft from the snapshot or overwrites an
//! existing one. Both paths run in a single transaction: the draft never
//! holds a mix of old and imported rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use draftsync_core::audit::{action_types, entity_types, import_modes};
use draftsync_core::error::CoreError;
use draftsync_core::module::SyncModule;
use draftsync_core::payload::{RemoteVersion, SyncPayload};
use draftsync_core::types::DbId;
use draftsync_db::models::audit::CreateAuditLog;
use draftsync_db::models::sync_id_mapping::NewIdMapping;
use draftsync_db::repositories::{
    AuditLogRepo, DraftContentRepo, DraftVersionRepo, SyncIdMappingRepo,
};
use draftsync_db::DbPool;
use draftsync_remote::{ProductionClient, SnapshotKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgConnection;

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::state::AppState;

/// Body of `POST /import`. Exactly one of `target_id` and `name` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub target_id: Option<DbId>,
    #[serde(default)]
    pub name: Option<String>,
    /// Overwrite this draft instead of creating a new one.
    #[serde(default)]
    pub draft_id: Option<DbId>,
    #[serde(default)]
    pub actor_id: Option<DbId>,
}

impl ImportRequest {
    fn snapshot_key(&self) -> Result<SnapshotKey, CoreError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        match (self.target_id, name) {
            (Some(id), None) => Ok(SnapshotKey::TargetId(id)),
            (None, Some(name)) => Ok(SnapshotKey::Name(name.to_string())),
            _ => Err(CoreError::Validation(
                "exactly one of target_id or name is required".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub draft_version_id: DbId,
    pub mode: &'static str,
    pub target_id: Option<DbId>,
    /// Rows inserted per module key.
    pub counts: BTreeMap<String, usize>,
    pub mappings: Vec<NewIdMapping>,
}

pub struct ImportEngine {
    pool: DbPool,
    config: Arc<ServerConfig>,
    production: Option<Arc<ProductionClient>>,
}

impl ImportEngine {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            config: Arc::clone(&state.config),
            production: state.production.clone(),
        }
    }

    fn client(&self) -> Result<&ProductionClient, CoreError> {
        self.production.as_deref().ok_or_else(|| {
            CoreError::Configuration("production API client is not configured".into())
        })
    }

    /// Versions available in production. Read-only, so allowed in either
    /// deployment mode.
    pub async fn pull_versions(&self) -> AppResult<Vec<RemoteVersion>> {
        self.config.sync.ensure_remote()?;
        let versions = self.client()?.list_versions().await?;
        tracing::debug!(count = versions.len(), "Listed production versions");
        Ok(versions)
    }

    pub async fn import(&self, request: &ImportRequest) -> AppResult<ImportResult> {
        let key = request.snapshot_key()?;
        self.config.sync.ensure_writable()?;
        let client = self.client()?;

        let payload = client.pull_snapshot(&key).await?;
        let target_id = match &key {
            SnapshotKey::TargetId(id) => Some(*id),
            SnapshotKey::Name(name) => client
                .list_versions()
                .await?
                .into_iter()
                .find(|v| v.app_version_name == *name)
                .map(|v| v.id),
        };

        let mut tx = self.pool.begin().await?;

        let (draft_id, mode) = match request.draft_id {
            Some(draft_id) => {
                DraftVersionRepo::find_for_update(&mut *tx, draft_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "DraftVersion",
                        id: draft_id,
                    })?;
                let removed = DraftContentRepo::delete_all_modules(&mut *tx, draft_id).await?;
                let unmapped = SyncIdMappingRepo::delete_for_draft(&mut *tx, draft_id).await?;
                DraftVersionRepo::overwrite_identity(&mut *tx, draft_id, &payload.version, target_id)
                    .await?;
                tracing::debug!(draft_id, removed, unmapped, "Cleared draft for import");
                (draft_id, import_modes::OVERWRITE)
            }
            None => {
                let draft = DraftVersionRepo::create_synced(&mut *tx, &payload.version, target_id)
                    .await?;
                (draft.id, import_modes::CREATE)
            }
        };

        let (counts, mappings) = insert_payload(&mut *tx, draft_id, &payload).await?;
        SyncIdMappingRepo::insert_many(&mut *tx, draft_id, &mappings).await?;

        AuditLogRepo::insert(
            &mut *tx,
            &CreateAuditLog {
                draft_version_id: Some(draft_id),
                actor_id: request.actor_id,
                action_type: action_types::IMPORT,
                entity_type: Some(entity_types::DRAFT_VERSION),
                entity_id: Some(draft_id),
                details_json: Some(json!({
                    "mode": mode,
                    "target_id": target_id,
                    "app_version_name": payload.version.app_version_name,
                    "counts": counts,
                    "mappings": mappings.len(),
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            draft_id,
            mode,
            target_id,
            mappings = mappings.len(),
            "Imported production version",
        );

        Ok(ImportResult {
            draft_version_id: draft_id,
            mode,
            target_id,
            counts,
            mappings,
        })
    }
}

/// Insert every entity of `payload` as a draft row. Returns the per-module
/// row counts and a mapping for each entity that carried a remote id.
async fn insert_payload(
    conn: &mut PgConnection,
    draft_id: DbId,
    payload: &SyncPayload,
) -> Result<(BTreeMap<String, usize>, Vec<NewIdMapping>), sqlx::Error> {
    let mut mappings = Vec::new();
    let mut record = |module: SyncModule, row_id: DbId, remote: Option<DbId>| {
        if let Some(remote_entity_id) = remote {
            mappings.push(NewIdMapping {
                module,
                draft_row_id: row_id,
                remote_entity_id,
            });
        }
    };

    for item in payload.banners.iter().flatten() {
        let row_id = DraftContentRepo::insert_banner(&mut *conn, draft_id, item).await?;
        record(SyncModule::Banners, row_id, item.id);
    }
    for item in payload.identities.iter().flatten() {
        let row_id = DraftContentRepo::insert_identity(&mut *conn, draft_id, item).await?;
        record(SyncModule::Identities, row_id, item.id);
    }
    for item in payload.scenes.iter().flatten() {
        let row_id = DraftContentRepo::insert_scene(&mut *conn, draft_id, item).await?;
        record(SyncModule::Scenes, row_id, item.id);
    }
    if let Some(item) = &payload.app_ui_fields {
        let row_id = DraftContentRepo::insert_app_ui_fields(&mut *conn, draft_id, item).await?;
        record(SyncModule::AppUiFields, row_id, item.id);
    }
    for item in payload.config_extra_steps.iter().flatten() {
        let row_id = DraftContentRepo::insert_extra_step(&mut *conn, draft_id, item).await?;
        record(SyncModule::ConfigExtraSteps, row_id, item.id);
    }
    for (module, items) in [
        (SyncModule::ClothesCategories, &payload.clothes_categories),
        (SyncModule::PhotoHobbies, &payload.photo_hobbies),
    ] {
        for item in items.iter().flatten() {
            let row_id =
                DraftContentRepo::insert_catalog_entry(&mut *conn, module, draft_id, item).await?;
            record(module, row_id, item.id);
        }
    }

    let counts = SyncModule::CANONICAL_ORDER
        .into_iter()
        .filter(|m| *m != SyncModule::VersionNames)
        .map(|m| (m.as_str().to_string(), payload.count(m)))
        .collect();

    Ok((counts, mappings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn snapshot_key_requires_exactly_one_selector() {
        let by_id = ImportRequest {
            target_id: Some(42),
            ..Default::default()
        };
        assert_eq!(by_id.snapshot_key().unwrap(), SnapshotKey::TargetId(42));

        let by_name = ImportRequest {
            name: Some(" harbor ".into()),
            ..Default::default()
        };
        assert_eq!(by_name.snapshot_key().unwrap(), SnapshotKey::Name("harbor".into()));

        let both = ImportRequest {
            target_id: Some(42),
            name: Some("harbor".into()),
            ..Default::default()
        };
        assert_matches!(both.snapshot_key(), Err(CoreError::Validation(_)));

        assert_matches!(
            ImportRequest::default().snapshot_key(),
            Err(CoreError::Validation(_))
        );

        let blank_name = ImportRequest {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert_matches!(blank_name.snapshot_key(), Err(CoreError::Validation(_)));
    }
}
