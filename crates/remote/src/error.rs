/// Errors from the production API client.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The production API returned a non-2xx status code.
    #[error("Production API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not match the expected schema.
    #[error("Unexpected production API response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the request never produced a response before the client
    /// timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

/// Errors from the blob store.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Cannot read local file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Cannot sign URL for {key}: {message}")]
    Presign { key: String, message: String },
}
