//! HTTP client for the production sync API.
//!
//! Three endpoints, all authenticated with the `X-Api-Key` header:
//!
//! | Method | Path                  | Purpose                         |
//! |--------|-----------------------|---------------------------------|
//! | POST   | `/api/sync/push`      | Replace a version's content     |
//! | GET    | `/api/sync/snapshot`  | Pull one version's full payload |
//! | GET    | `/api/sync/versions`  | List versions offered to import |
//!
//! Requests time out after the configured duration and are never retried.

use std::time::Duration;

use draftsync_core::payload::{
    PushAccepted, PushConflict, PushRejected, PushRequest, RemoteEnvelope, RemoteVersion,
    SyncPayload,
};
use draftsync_core::types::DbId;
use draftsync_core::validation::ValidationIssue;
use reqwest::StatusCode;

use crate::error::RemoteError;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Result of a push that reached the production API and got a response.
#[derive(Debug, Clone)]
pub enum PushOutcome {
    /// 2xx: the version was written.
    Accepted(PushAccepted),
    /// 409 with `need_confirm`: the natural key exists remotely and the
    /// caller must retry with `confirm = true` to replace it.
    NeedConfirm(PushConflict),
    /// Any other non-2xx response.
    Rejected {
        status: u16,
        message: String,
        details: Vec<ValidationIssue>,
    },
}

/// How a snapshot is addressed on pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotKey {
    TargetId(DbId),
    Name(String),
}

impl SnapshotKey {
    fn query(&self) -> (&'static str, String) {
        match self {
            Self::TargetId(id) => ("target_id", id.to_string()),
            Self::Name(name) => ("name", name.clone()),
        }
    }
}

/// Client for one production deployment.
#[derive(Debug, Clone)]
pub struct ProductionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ProductionClient {
    /// Create a client for `base_url` (e.g. `https://prod.example.com`).
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Push one draft's in-scope content.
    ///
    /// Only transport failures and undecodable 2xx bodies are `Err`; every
    /// HTTP response maps to a [`PushOutcome`].
    pub async fn push(&self, request: &PushRequest) -> Result<PushOutcome, RemoteError> {
        let response = self
            .client
            .post(format!("{}/api/sync/push", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let accepted: PushAccepted = serde_json::from_str(&body)
                .map_err(|e| RemoteError::Decode(format!("push response: {e}")))?;
            return Ok(PushOutcome::Accepted(accepted));
        }

        if status == StatusCode::CONFLICT {
            if let Ok(conflict) = serde_json::from_str::<PushConflict>(&body) {
                if conflict.need_confirm {
                    return Ok(PushOutcome::NeedConfirm(conflict));
                }
                if !conflict.reason.is_empty() {
                    return Ok(PushOutcome::Rejected {
                        status: status.as_u16(),
                        message: conflict.reason,
                        details: Vec::new(),
                    });
                }
            }
        }

        let rejected = serde_json::from_str::<PushRejected>(&body).unwrap_or_default();
        let message = if rejected.error.is_empty() {
            format!("production API returned {status}: {}", truncate(&body, 300))
        } else {
            rejected.error
        };
        Ok(PushOutcome::Rejected {
            status: status.as_u16(),
            message,
            details: rejected.details,
        })
    }

    /// Pull the full payload of one production version.
    pub async fn pull_snapshot(&self, key: &SnapshotKey) -> Result<SyncPayload, RemoteError> {
        let response = self
            .client
            .get(format!("{}/api/sync/snapshot", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[key.query()])
            .send()
            .await?;

        let envelope: RemoteEnvelope<SyncPayload> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    /// List the versions available for import.
    pub async fn list_versions(&self) -> Result<Vec<RemoteVersion>, RemoteError> {
        let response = self
            .client
            .get(format!("{}/api/sync/versions", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let envelope: RemoteEnvelope<Vec<RemoteVersion>> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or [`RemoteError::Api`] with the status and
    /// body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
