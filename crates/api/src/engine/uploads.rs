//! Upload phase of a sync.
//!
//! An [`UploadSession`] is created per sync call. It uploads each distinct
//! local media path at most once and remembers the stored key, so a file
//! referenced by several rows or columns goes up once.

use std::collections::BTreeMap;
use std::path::PathBuf;

use draftsync_core::media::{is_local_path, object_key, resolve_local_file};
use draftsync_core::module::SyncModule;
use draftsync_core::types::DbId;
use draftsync_db::models::content::MediaRef;
use draftsync_db::repositories::DraftContentRepo;
use draftsync_db::DbPool;
use draftsync_remote::BlobStore;

use crate::config::SyncConfig;
use crate::error::AppResult;

/// A row column to repoint at an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRewrite {
    pub module: SyncModule,
    pub row_id: DbId,
    pub column: &'static str,
    pub stored_path: String,
}

pub struct UploadSession {
    draft_id: DbId,
    local_root: PathBuf,
    local_prefix: String,
    key_prefix: String,
    /// Original local path -> stored object path.
    uploaded: BTreeMap<String, String>,
    /// Original local path -> file on disk, for cleanup after a successful
    /// push.
    local_files: BTreeMap<String, PathBuf>,
}

impl UploadSession {
    pub fn new(draft_id: DbId, config: &SyncConfig) -> Self {
        Self {
            draft_id,
            local_root: config.local_media_root.clone(),
            local_prefix: config.local_media_prefix.clone(),
            key_prefix: config.blob_key_prefix.clone(),
            uploaded: BTreeMap::new(),
            local_files: BTreeMap::new(),
        }
    }

    /// The refs that point at local storage.
    pub fn local_refs<'a>(&self, refs: &'a [MediaRef]) -> Vec<&'a MediaRef> {
        refs.iter()
            .filter(|r| is_local_path(&r.path, &self.local_prefix))
            .collect()
    }

    /// Upload every local path in `refs` not yet uploaded by this session and
    /// return one rewrite per referencing column.
    pub async fn upload_all(
        &mut self,
        store: &dyn BlobStore,
        refs: &[&MediaRef],
    ) -> AppResult<Vec<MediaRewrite>> {
        let mut rewrites = Vec::with_capacity(refs.len());

        for media in refs {
            let stored = match self.uploaded.get(&media.path) {
                Some(stored) => stored.clone(),
                None => {
                    let file = resolve_local_file(&self.local_root, &media.path, &self.local_prefix)?;
                    let key = object_key(&self.key_prefix, self.draft_id, &media.path);
                    let stored = store.upload(&key, &file).await?;
                    tracing::info!(
                        draft_id = self.draft_id,
                        path = %media.path,
                        key = %stored,
                        "Uploaded local media",
                    );
                    self.uploaded.insert(media.path.clone(), stored.clone());
                    self.local_files.insert(media.path.clone(), file);
                    stored
                }
            };

            rewrites.push(MediaRewrite {
                module: media.module,
                row_id: media.row_id,
                column: media.column,
                stored_path: stored,
            });
        }

        Ok(rewrites)
    }

    pub fn draft_id(&self) -> DbId {
        self.draft_id
    }

    pub fn uploaded(&self) -> &BTreeMap<String, String> {
        &self.uploaded
    }

    /// Delete the local files uploaded by this session that no row in any
    /// draft still references. Failures are logged and otherwise ignored.
    pub async fn remove_orphaned_files(&self, pool: &DbPool) {
        let mut conn = match pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(draft_id = self.draft_id, error = %e, "Skipped local media cleanup");
                return;
            }
        };

        for (path, file) in &self.local_files {
            match DraftContentRepo::count_media_references(&mut conn, path).await {
                Ok(0) => {}
                Ok(remaining) => {
                    tracing::debug!(
                        draft_id = self.draft_id,
                        path = %path,
                        remaining,
                        "Kept local media still referenced",
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        draft_id = self.draft_id,
                        path = %path,
                        error = %e,
                        "Kept local media, reference check failed",
                    );
                    continue;
                }
            }

            if let Err(e) = tokio::fs::remove_file(file).await {
                tracing::warn!(
                    draft_id = self.draft_id,
                    file = %file.display(),
                    error = %e,
                    "Failed to remove uploaded local file",
                );
            }
        }
    }
}
