use crate::types::DbId;
use crate::validation::ValidationIssue;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Required-field checks failed on a draft snapshot. Carries one issue
    /// per offending `(module, row, field)`.
    #[error("Draft validation failed: {message}")]
    InvalidDraft {
        message: String,
        details: Vec<ValidationIssue>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation is disabled by the deployment mode or is missing
    /// required configuration (remote URL, API key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
