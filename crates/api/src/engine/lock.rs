//! Per-draft sync lock.
//!
//! A session-level Postgres advisory lock held on a connection opened
//! outside the pool, so a long sync never spends a pool slot on the lock.
//! Dropping the guard closes the connection, which releases the lock, so a
//! cancelled request never leaves a draft locked. Works across server
//! processes.

use draftsync_core::error::CoreError;
use draftsync_core::types::DbId;
use draftsync_db::DbPool;
use sqlx::{Connection, PgConnection};

use crate::error::AppResult;

/// First key of the two-key advisory lock, reserved for draft syncs.
const SYNC_LOCK_NAMESPACE: i32 = 0x5359_4e43;

/// Fold a draft id into the second 32-bit lock key. Ids below 2^31 map to
/// themselves.
fn lock_key(draft_id: DbId) -> i32 {
    (draft_id ^ (draft_id >> 32)) as i32
}

/// Held for the duration of one sync of one draft.
pub struct DraftSyncLock {
    conn: PgConnection,
    draft_id: DbId,
}

impl DraftSyncLock {
    /// Take the lock or fail fast with `Conflict` if another sync of the
    /// same draft holds it.
    ///
    /// Opens one connection with the pool's options on top of the pool's
    /// `max_connections`; the database must allow that many more sessions
    /// as there are concurrent syncs.
    pub async fn try_acquire(pool: &DbPool, draft_id: DbId) -> AppResult<Self> {
        let mut conn = PgConnection::connect_with(&pool.connect_options()).await?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1, $2)")
            .bind(SYNC_LOCK_NAMESPACE)
            .bind(lock_key(draft_id))
            .fetch_one(&mut conn)
            .await?;

        if !acquired {
            tracing::info!(draft_id, "Sync lock busy");
            if let Err(e) = conn.close().await {
                tracing::debug!(draft_id, error = %e, "Failed to close lock connection");
            }
            return Err(CoreError::Conflict(format!(
                "a sync is already running for draft {draft_id}"
            ))
            .into());
        }

        tracing::debug!(draft_id, "Sync lock acquired");
        Ok(Self { conn, draft_id })
    }

    pub async fn release(mut self) -> AppResult<()> {
        sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1, $2)")
            .bind(SYNC_LOCK_NAMESPACE)
            .bind(lock_key(self.draft_id))
            .fetch_one(&mut self.conn)
            .await?;
        self.conn.close().await?;
        tracing::debug!(draft_id = self.draft_id, "Sync lock released");
        Ok(())
    }
}
