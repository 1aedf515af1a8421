use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use draftsync_core::error::CoreError;
use draftsync_core::types::DbId;
use draftsync_core::validation::ValidationIssue;
use draftsync_remote::{BlobError, RemoteError};
use serde_json::json;

/// Application-level error type for HTTP handlers and engines.
///
/// Wraps [`CoreError`] for domain errors and adds variants for the outbound
/// collaborators. Implements [`IntoResponse`] to produce consistent JSON
/// error responses: `{ "error", "code", "details"? }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `draftsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The production API could not be reached or answered unexpectedly.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Media upload to the blob store failed.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The production API refused a push, optionally with itemized issues.
    #[error("Production rejected the push: {message}")]
    Upstream {
        message: String,
        details: Vec<ValidationIssue>,
    },

    /// The pushed version already exists in production; retry with
    /// `confirm = true` to replace it.
    #[error("Confirmation required: {reason}")]
    NeedConfirm {
        reason: String,
        target_id: Option<DbId>,
        job_id: DbId,
    },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler and engine return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn status_code_message(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                CoreError::InvalidDraft { message, details } => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    message.clone(),
                    Some(json!(details)),
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
                CoreError::Configuration(msg) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                    None,
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => {
                let (status, code, message) = classify_sqlx_error(err);
                (status, code, message, None)
            }

            // --- Outbound collaborators ---
            AppError::Remote(err) => {
                tracing::warn!(error = %err, "Production API call failed");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string(), None)
            }
            // The draft points at a local file that is missing or unreadable.
            AppError::Blob(err @ BlobError::Read { path, .. }) => {
                tracing::warn!(error = %err, "Local media unreadable");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "LOCAL_MEDIA_ERROR",
                    err.to_string(),
                    Some(json!({ "path": path })),
                )
            }
            AppError::Blob(err) => {
                tracing::warn!(error = %err, "Blob store call failed");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string(), None)
            }
            AppError::Upstream { message, details } => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                message.clone(),
                (!details.is_empty()).then(|| json!(details)),
            ),
            AppError::NeedConfirm {
                reason,
                target_id,
                job_id,
            } => (
                StatusCode::CONFLICT,
                "CONFLICT",
                reason.clone(),
                Some(json!({
                    "need_confirm": true,
                    "target_id": target_id,
                    "job_id": job_id,
                })),
            ),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.status_code_message();

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_and_code(err: AppError) -> (StatusCode, &'static str) {
        let (status, code, _, _) = err.status_code_message();
        (status, code)
    }

    #[test]
    fn core_errors_map_to_documented_statuses() {
        let cases = [
            (
                AppError::Core(CoreError::Configuration("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFIGURATION_ERROR",
            ),
            (
                AppError::Core(CoreError::Validation("x".into())),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AppError::Core(CoreError::NotFound {
                    entity: "DraftVersion",
                    id: 1,
                }),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Core(CoreError::Conflict("x".into())),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::Core(CoreError::Internal("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
            (
                AppError::Database(sqlx::Error::RowNotFound),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(status_and_code(err), (status, code));
        }
    }

    #[test]
    fn invalid_draft_carries_details() {
        let err = AppError::Core(CoreError::InvalidDraft {
            message: "scenes: name is required".into(),
            details: vec![ValidationIssue {
                module: "scenes".into(),
                row_id: Some(3),
                field: "name".into(),
                message: "name is required".into(),
            }],
        });
        let (status, code, _, details) = err.status_code_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert_eq!(details.unwrap()[0]["row_id"], 3);
    }

    #[test]
    fn need_confirm_is_a_conflict_with_target() {
        let err = AppError::NeedConfirm {
            reason: "version exists".into(),
            target_id: Some(88),
            job_id: 4,
        };
        let (status, code, message, details) = err.status_code_message();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CONFLICT");
        assert_eq!(message, "version exists");
        let details = details.unwrap();
        assert_eq!(details["need_confirm"], true);
        assert_eq!(details["target_id"], 88);
    }

    #[test]
    fn upstream_rejection_is_bad_gateway() {
        let err = AppError::Upstream {
            message: "boom".into(),
            details: vec![],
        };
        let (status, code, _, details) = err.status_code_message();
        assert_eq!((status, code), (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"));
        assert!(details.is_none());
    }

    #[test]
    fn unreadable_local_media_is_not_an_upstream_failure() {
        let err = AppError::Blob(BlobError::Read {
            path: "/srv/storage/scenes/pier.png".into(),
            message: "No such file or directory".into(),
        });
        let (status, code, message, details) = err.status_code_message();
        assert_eq!((status, code), (StatusCode::UNPROCESSABLE_ENTITY, "LOCAL_MEDIA_ERROR"));
        assert!(message.contains("scenes/pier.png"));
        assert_eq!(details.unwrap()["path"], "/srv/storage/scenes/pier.png");

        let err = AppError::Blob(BlobError::Upload {
            key: "drafts/1/pier.png".into(),
            message: "503".into(),
        });
        assert_eq!(
            status_and_code(err),
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
        );
    }
}
