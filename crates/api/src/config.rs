use std::path::PathBuf;
use std::time::Duration;

use draftsync_core::error::CoreError;
use draftsync_core::media::DEFAULT_LOCAL_PREFIX;

/// Which side of the draft/production split this deployment runs on.
///
/// `Online` deployments serve production traffic and must never push or
/// import: both operations write drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Draft,
    Online,
}

impl DeployMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "online" => Some(Self::Online),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Online => "online",
        }
    }
}

/// Settings for the sync and import engines.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub deploy_mode: DeployMode,
    /// Production API base URL. Sync and import are disabled when unset.
    pub production_api_url: Option<String>,
    pub production_api_key: Option<String>,
    /// Timeout for every outbound production API call.
    pub timeout_secs: u64,
    /// Directory that local media paths resolve under.
    pub local_media_root: PathBuf,
    /// Prefix marking a media path as local storage, e.g. `/local/`.
    pub local_media_prefix: String,
    /// Blob bucket uploads go to. Drafts with local media cannot be synced
    /// when unset.
    pub blob_bucket: Option<String>,
    pub blob_key_prefix: String,
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `(url, api_key)` when both are set.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        match (&self.production_api_url, &self.production_api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    /// Whether both the production URL and API key are set.
    pub fn remote_configured(&self) -> bool {
        self.remote_credentials().is_some()
    }

    /// Reject with `Configuration` unless the production API is reachable
    /// from this deployment.
    pub fn ensure_remote(&self) -> Result<(), CoreError> {
        if !self.remote_configured() {
            return Err(CoreError::Configuration(
                "PRODUCTION_API_URL and PRODUCTION_API_KEY must both be set".into(),
            ));
        }
        Ok(())
    }

    /// Gate for operations that write drafts from or to production.
    pub fn ensure_writable(&self) -> Result<(), CoreError> {
        if self.deploy_mode == DeployMode::Online {
            return Err(CoreError::Configuration(
                "sync and import are disabled in online mode".into(),
            ));
        }
        self.ensure_remote()
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let deploy_mode = non_empty("DEPLOY_MODE")
            .map(|v| {
                DeployMode::parse(&v)
                    .unwrap_or_else(|| panic!("DEPLOY_MODE must be 'draft' or 'online', got '{v}'"))
            })
            .unwrap_or(DeployMode::Draft);

        let timeout_secs: u64 = non_empty("SYNC_TIMEOUT_SECS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .expect("SYNC_TIMEOUT_SECS must be a valid u64");

        Self {
            deploy_mode,
            production_api_url: non_empty("PRODUCTION_API_URL"),
            production_api_key: non_empty("PRODUCTION_API_KEY"),
            timeout_secs,
            local_media_root: PathBuf::from(
                non_empty("LOCAL_MEDIA_ROOT").unwrap_or_else(|| "./storage".into()),
            ),
            local_media_prefix: non_empty("LOCAL_MEDIA_PREFIX")
                .unwrap_or_else(|| DEFAULT_LOCAL_PREFIX.into()),
            blob_bucket: non_empty("BLOB_BUCKET"),
            blob_key_prefix: non_empty("BLOB_KEY_PREFIX").unwrap_or_else(|| "drafts".into()),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub sync: SyncConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DEPLOY_MODE`          | `draft` (`draft`/`online`) |
    /// | `PRODUCTION_API_URL`   | unset                      |
    /// | `PRODUCTION_API_KEY`   | unset                      |
    /// | `SYNC_TIMEOUT_SECS`    | `20`                       |
    /// | `LOCAL_MEDIA_ROOT`     | `./storage`                |
    /// | `LOCAL_MEDIA_PREFIX`   | `/local/`                  |
    /// | `BLOB_BUCKET`          | unset                      |
    /// | `BLOB_KEY_PREFIX`      | `drafts`                   |
    ///
    /// `DATABASE_URL` is read separately by the binary.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = var("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let sync = SyncConfig::from_lookup(&var);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            sync,
        }
    }
}
