//! Classification of media paths referenced by draft rows.
//!
//! Draft rows point either at files that already live in the blob store or
//! at files in local storage (uploaded through the editor and not yet
//! pushed). Local paths carry a configurable prefix, e.g. `/local/`.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::types::DbId;

/// Default prefix marking a path as local-storage backed.
pub const DEFAULT_LOCAL_PREFIX: &str = "/local/";

/// Whether `path` refers to local storage and must be uploaded before push.
pub fn is_local_path(path: &str, local_prefix: &str) -> bool {
    !local_prefix.is_empty() && path.starts_with(local_prefix) && path.len() > local_prefix.len()
}

/// Map a local media path onto the file under `root`.
///
/// Rejects paths that would escape `root` (`..`, absolute segments).
pub fn resolve_local_file(root: &Path, path: &str, local_prefix: &str) -> Result<PathBuf, CoreError> {
    let relative = path
        .strip_prefix(local_prefix)
        .ok_or_else(|| CoreError::Validation(format!("'{path}' is not a local media path")))?;

    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(CoreError::Validation(format!(
            "Local media path '{path}' must not leave the media root"
        )));
    }

    Ok(root.join(relative))
}

/// Blob object key for a local file uploaded on behalf of a draft.
///
/// Derived from the original path, so re-uploading the same file for the
/// same draft overwrites one object instead of accumulating copies.
pub fn object_key(key_prefix: &str, draft_id: DbId, path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let short: String = format!("{digest:x}").chars().take(16).collect();
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let prefix = key_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{draft_id}/{short}-{file_name}")
    } else {
        format!("{prefix}/{draft_id}/{short}-{file_name}")
    }
}
