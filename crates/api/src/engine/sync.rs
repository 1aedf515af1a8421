//! Push a draft to production.
//!
//! One call: gate on configuration, resolve the module scope, take the
//! per-draft lock, validate, open a job, upload local media, push, and
//! record the outcome on the draft, the job and the audit trail.

use std::collections::BTreeMap;
use std::sync::Arc;

use draftsync_core::audit::{action_types, entity_types};
use draftsync_core::error::CoreError;
use draftsync_core::module::{resolve_scope, ModuleScope, SyncModule};
use draftsync_core::payload::{PushRequest, SyncPayload};
use draftsync_core::status::SyncStatus;
use draftsync_core::types::DbId;
use draftsync_core::validation::{summarize, validate_payload};
use draftsync_db::models::audit::CreateAuditLog;
use draftsync_db::models::content::DraftSnapshot;
use draftsync_db::repositories::{AuditLogRepo, DraftContentRepo, DraftVersionRepo};
use draftsync_db::DbPool;
use draftsync_remote::{BlobStore, ProductionClient, PushOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ServerConfig;
use crate::engine::jobs::{JobOutcome, JobTracker, SyncJobHandle};
use crate::engine::lock::DraftSyncLock;
use crate::engine::uploads::UploadSession;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of `POST /drafts/{id}/sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub trigger_by: DbId,
    #[serde(default)]
    pub confirm: bool,
    /// Module keys; empty means every module.
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub job_id: DbId,
    pub target_id: DbId,
    pub modules: Vec<SyncModule>,
    /// Entities pushed per module key.
    pub counts: BTreeMap<String, usize>,
    /// Local path -> stored object path, for media uploaded by this call.
    pub uploaded: BTreeMap<String, String>,
}

pub struct SyncOrchestrator {
    pool: DbPool,
    config: Arc<ServerConfig>,
    production: Option<Arc<ProductionClient>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    tracker: JobTracker,
}

impl SyncOrchestrator {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            config: Arc::clone(&state.config),
            production: state.production.clone(),
            blob_store: state.blob_store.clone(),
            tracker: JobTracker::new(state.pool.clone()),
        }
    }

    pub async fn sync(&self, draft_id: DbId, request: &SyncRequest) -> AppResult<SyncResult> {
        self.config.sync.ensure_writable()?;
        let production = self.production.clone().ok_or_else(|| {
            CoreError::Configuration("production API client is not configured".into())
        })?;
        let scope = resolve_scope(&request.modules)?;

        let lock = DraftSyncLock::try_acquire(&self.pool, draft_id).await?;
        let result = self
            .sync_locked(draft_id, request, &scope, &production)
            .await;
        if let Err(e) = lock.release().await {
            tracing::warn!(draft_id, error = %e, "Failed to release sync lock");
        }
        result
    }

    async fn sync_locked(
        &self,
        draft_id: DbId,
        request: &SyncRequest,
        scope: &ModuleScope,
        production: &ProductionClient,
    ) -> AppResult<SyncResult> {
        let snapshot = self.load_snapshot(draft_id).await?;
        let issues = validate_payload(&snapshot.to_payload(scope), scope);
        if !issues.is_empty() {
            let message = summarize(&issues);
            DraftVersionRepo::set_sync_status(&self.pool, draft_id, SyncStatus::Failed, Some(&message))
                .await?;
            tracing::info!(draft_id, issues = issues.len(), "Draft failed pre-sync validation");
            return Err(CoreError::InvalidDraft {
                message,
                details: issues,
            }
            .into());
        }

        let modules = scope.modules();
        let handle = self
            .tracker
            .open(draft_id, request.trigger_by, request.confirm, &modules)
            .await?;

        match self.run_job(&handle, request, scope, snapshot, production).await {
            Ok(result) => Ok(result),
            // Job and draft were already moved to pending_confirm.
            Err(e @ AppError::NeedConfirm { .. }) => Err(e),
            Err(e) => {
                self.fail_job(&handle, &e).await;
                Err(e)
            }
        }
    }

    /// Everything after the job is opened. Any `Err` other than
    /// `NeedConfirm` leaves the job running for the caller to fail.
    async fn run_job(
        &self,
        handle: &SyncJobHandle,
        request: &SyncRequest,
        scope: &ModuleScope,
        snapshot: DraftSnapshot,
        production: &ProductionClient,
    ) -> AppResult<SyncResult> {
        let draft_id = handle.draft_id;
        DraftVersionRepo::set_sync_status(&self.pool, draft_id, SyncStatus::Running, None).await?;

        let mut uploads = UploadSession::new(draft_id, &self.config.sync);
        let snapshot = self.upload_media(&mut uploads, snapshot, scope).await?;

        let payload = snapshot.to_payload(scope);
        let counts = module_counts(&payload, &handle.modules);
        let push = PushRequest {
            payload,
            draft_version_id: draft_id,
            trigger_by: request.trigger_by,
            confirm: request.confirm,
            modules: scope.keys(),
        };

        match production.push(&push).await? {
            PushOutcome::Accepted(accepted) => {
                let target_id = accepted.target_app_version_name_id;

                let mut tx = self.pool.begin().await?;
                DraftVersionRepo::mark_synced(&mut *tx, draft_id, target_id).await?;
                AuditLogRepo::insert(
                    &mut *tx,
                    &CreateAuditLog {
                        draft_version_id: Some(draft_id),
                        actor_id: Some(request.trigger_by),
                        action_type: action_types::SYNC,
                        entity_type: Some(entity_types::SYNC_JOB),
                        entity_id: Some(handle.job_id),
                        details_json: Some(json!({
                            "target_id": target_id,
                            "confirm": request.confirm,
                            "modules": scope.keys(),
                            "counts": counts,
                            "uploaded": uploads.uploaded().len(),
                        })),
                    },
                )
                .await?;
                JobTracker::finish_with(&mut *tx, handle, &JobOutcome::Success { target_id })
                    .await?;
                tx.commit().await?;

                tracing::info!(
                    draft_id,
                    job_id = handle.job_id,
                    target_id,
                    uploaded = uploads.uploaded().len(),
                    "Draft synced to production",
                );

                uploads.remove_orphaned_files(&self.pool).await;

                Ok(SyncResult {
                    job_id: handle.job_id,
                    target_id,
                    modules: handle.modules.clone(),
                    counts,
                    uploaded: uploads.uploaded().clone(),
                })
            }
            PushOutcome::NeedConfirm(conflict) => {
                let target_id = conflict.target_app_version_name_id;
                let reason = if conflict.reason.is_empty() {
                    "version already exists in production".to_string()
                } else {
                    conflict.reason
                };

                let mut tx = self.pool.begin().await?;
                DraftVersionRepo::mark_pending_confirm(&mut *tx, draft_id, &reason, target_id)
                    .await?;
                JobTracker::finish_with(
                    &mut *tx,
                    handle,
                    &JobOutcome::PendingConfirm {
                        reason: reason.clone(),
                        target_id,
                    },
                )
                .await?;
                tx.commit().await?;

                tracing::info!(
                    draft_id,
                    job_id = handle.job_id,
                    target_id,
                    reason = %reason,
                    "Push needs confirmation",
                );

                Err(AppError::NeedConfirm {
                    reason,
                    target_id,
                    job_id: handle.job_id,
                })
            }
            PushOutcome::Rejected {
                status,
                message,
                details,
            } => {
                tracing::warn!(
                    draft_id,
                    job_id = handle.job_id,
                    status,
                    message = %message,
                    details = details.len(),
                    "Production rejected the push",
                );
                Err(AppError::Upstream { message, details })
            }
        }
    }

    /// Upload every local media file in scope and repoint the owning rows.
    /// Returns the snapshot to push, reloaded if anything was rewritten.
    async fn upload_media(
        &self,
        uploads: &mut UploadSession,
        snapshot: DraftSnapshot,
        scope: &ModuleScope,
    ) -> AppResult<DraftSnapshot> {
        let refs = snapshot.media_refs(scope);
        let local = uploads.local_refs(&refs);
        if local.is_empty() {
            return Ok(snapshot);
        }

        let store = self.blob_store.as_deref().ok_or_else(|| {
            CoreError::Configuration(format!(
                "draft {} references {} local media file(s) but no blob store is configured",
                uploads.draft_id(),
                local.len()
            ))
        })?;
        let rewrites = uploads.upload_all(store, &local).await?;

        let mut tx = self.pool.begin().await?;
        for rewrite in &rewrites {
            DraftContentRepo::update_media_path(
                &mut *tx,
                rewrite.module,
                rewrite.row_id,
                rewrite.column,
                &rewrite.stored_path,
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(
            draft_id = uploads.draft_id(),
            rows = rewrites.len(),
            files = uploads.uploaded().len(),
            "Rewrote local media paths",
        );

        self.load_snapshot(uploads.draft_id()).await
    }

    async fn load_snapshot(&self, draft_id: DbId) -> AppResult<DraftSnapshot> {
        let mut conn = self.pool.acquire().await?;
        DraftContentRepo::load_snapshot(&mut conn, draft_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "DraftVersion",
                    id: draft_id,
                }
                .into()
            })
    }

    /// Fail the job and, if this call was the one to finish it, the draft.
    async fn fail_job(&self, handle: &SyncJobHandle, error: &AppError) {
        let message = error.to_string();
        let finished = match self
            .tracker
            .finish(handle, &JobOutcome::Failed(message.clone()))
            .await
        {
            Ok(finished) => finished,
            Err(e) => {
                tracing::error!(job_id = handle.job_id, error = %e, "Failed to finish sync job");
                return;
            }
        };

        if finished {
            if let Err(e) = DraftVersionRepo::set_sync_status(
                &self.pool,
                handle.draft_id,
                SyncStatus::Failed,
                Some(&message),
            )
            .await
            {
                tracing::error!(draft_id = handle.draft_id, error = %e, "Failed to mark draft sync failed");
            }
        }
    }
}

fn module_counts(payload: &SyncPayload, modules: &[SyncModule]) -> BTreeMap<String, usize> {
    modules
        .iter()
        .map(|m| (m.as_str().to_string(), payload.count(*m)))
        .collect()
}
