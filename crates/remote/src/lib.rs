//! Outbound collaborators of the sync service: the production API client
//! and the blob store media is uploaded to before a push.

pub mod blob;
pub mod client;
pub mod error;

pub use blob::{BlobStore, S3BlobStore};
pub use client::{ProductionClient, PushOutcome, SnapshotKey};
pub use error::{BlobError, RemoteError};
