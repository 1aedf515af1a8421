//! Blob storage for media referenced by pushed drafts.
//!
//! The production side reads media by object key, so every local file a
//! draft references is uploaded under a deterministic key before push.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::BlobError;

/// Object storage used by the sync upload phase.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `file` under `key`. Returns the stored path that draft rows
    /// should reference from now on.
    async fn upload(&self, key: &str, file: &Path) -> Result<String, BlobError>;

    /// A time-limited URL for reading `key`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, BlobError>;
}

/// [`BlobStore`] backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a store from the default AWS credential/region chain
    /// (`AWS_REGION`, `AWS_ACCESS_KEY_ID`, profiles, instance metadata).
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, file: &Path) -> Result<String, BlobError> {
        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| BlobError::Read {
                path: file.display().to_string(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| BlobError::Upload {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, key, "Uploaded media object");
        Ok(key.to_string())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        let presign_error = |message: String| BlobError::Presign {
            key: key.to_string(),
            message,
        };

        let config = PresigningConfig::expires_in(ttl).map_err(|e| presign_error(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| presign_error(aws_sdk_s3::error::DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
