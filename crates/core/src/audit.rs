//! Audit logging constants and detail sanitization.

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Action types written to `audit_logs.action_type`.
pub mod action_types {
    pub const SUBMIT: &str = "submit";
    pub const CONFIRM: &str = "confirm";
    pub const SYNC: &str = "sync";
    pub const IMPORT: &str = "import";
}

/// Entity types written to `audit_logs.entity_type`.
pub mod entity_types {
    pub const SUBMISSION: &str = "submission";
    pub const DRAFT_VERSION: &str = "draft_version";
    pub const SYNC_JOB: &str = "sync_job";
}

/// Import modes recorded in the `import` audit details.
pub mod import_modes {
    pub const CREATE: &str = "create";
    pub const OVERWRITE: &str = "overwrite";
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Keys whose values never reach the audit table.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
    "signature",
];

/// Redact sensitive keys from an audit detail blob, recursively.
///
/// Submission payloads are editor-supplied, so anything that looks like a
/// credential (including signed URLs' signatures) is replaced with
/// `"[REDACTED]"` before storage.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, val)| {
                    let lower_key = key.to_lowercase();
                    if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                        (key.clone(), serde_json::Value::String("[REDACTED]".into()))
                    } else {
                        (key.clone(), redact_sensitive_fields(val))
                    }
                })
                .collect();
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}
