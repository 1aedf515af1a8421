use std::sync::Arc;

use draftsync_remote::{BlobStore, ProductionClient};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: draftsync_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Production API client; `None` when the URL or key is not configured.
    pub production: Option<Arc<ProductionClient>>,
    /// Media blob store; `None` when no bucket is configured.
    pub blob_store: Option<Arc<dyn BlobStore>>,
}
