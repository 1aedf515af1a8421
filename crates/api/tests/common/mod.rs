#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get as route_get, post};
use axum::{Json, Router};
use draftsync_api::config::{DeployMode, ServerConfig, SyncConfig};
use draftsync_api::router::build_app_router;
use draftsync_api::state::AppState;
use draftsync_core::payload::{SceneItem, VersionBlock};
use draftsync_core::types::DbId;
use draftsync_db::models::draft_version::CreateDraftVersion;
use draftsync_db::repositories::{DraftContentRepo, DraftVersionRepo};
use draftsync_remote::{BlobError, BlobStore, ProductionClient};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

pub const API_KEY: &str = "test-key";

/// Build a test `ServerConfig`: draft mode, no production API, no blob
/// store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        sync: SyncConfig {
            deploy_mode: DeployMode::Draft,
            production_api_url: None,
            production_api_key: None,
            timeout_secs: 5,
            local_media_root: PathBuf::from("./storage"),
            local_media_prefix: "/local/".to_string(),
            blob_bucket: None,
            blob_key_prefix: "drafts".to_string(),
        },
    }
}

/// The full application router without outbound collaborators.
pub fn build_test_app(pool: PgPool) -> Router {
    TestApp::new(pool).router()
}

/// Builder for apps wired to a fake production API and blob store.
pub struct TestApp {
    pool: PgPool,
    config: ServerConfig,
    production: Option<Arc<ProductionClient>>,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: test_config(),
            production: None,
            blob_store: None,
        }
    }

    pub fn with_production(mut self, base_url: &str) -> Self {
        self.config.sync.production_api_url = Some(base_url.to_string());
        self.config.sync.production_api_key = Some(API_KEY.to_string());
        let client = ProductionClient::new(base_url, API_KEY, self.config.sync.timeout()).unwrap();
        self.production = Some(Arc::new(client));
        self
    }

    pub fn with_blob_store(mut self, store: Arc<MemoryBlobStore>, media_root: &Path) -> Self {
        self.config.sync.blob_bucket = Some("test-bucket".to_string());
        self.config.sync.local_media_root = media_root.to_path_buf();
        self.blob_store = Some(store as Arc<dyn BlobStore>);
        self
    }

    pub fn online(mut self) -> Self {
        self.config.sync.deploy_mode = DeployMode::Online;
        self
    }

    pub fn router(self) -> Router {
        let state = AppState {
            pool: self.pool,
            config: Arc::new(self.config.clone()),
            production: self.production,
            blob_store: self.blob_store,
        };
        build_app_router(state, &self.config)
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A draft that passes pre-sync validation: named, with one scene.
pub async fn seed_valid_draft(pool: &PgPool, name: &str) -> DbId {
    let draft = DraftVersionRepo::create(
        pool,
        &CreateDraftVersion {
            app_version_name: name.to_string(),
            location_name: Some("Harbor".to_string()),
            feishu_field_names: None,
            ai_modal: None,
            status: None,
        },
    )
    .await
    .unwrap();
    DraftContentRepo::insert_scene(
        pool,
        draft.id,
        &SceneItem {
            name: "Pier".to_string(),
            image: "drafts/pier.png".to_string(),
            ..SceneItem::default()
        },
    )
    .await
    .unwrap();
    draft.id
}

// ---------------------------------------------------------------------------
// Fake production API
// ---------------------------------------------------------------------------

/// Shared state of the fake production API. Tests seed it and inspect the
/// recorded pushes.
#[derive(Default)]
pub struct FakeProduction {
    /// Bodies of accepted pushes.
    pub pushes: Vec<Value>,
    /// Natural key -> production id.
    pub existing: HashMap<String, DbId>,
    pub next_id: DbId,
    /// When set, every push answers with this status and body.
    pub reject_with: Option<(StatusCode, Value)>,
    /// Production id -> snapshot payload.
    pub snapshots: HashMap<DbId, Value>,
}

pub type SharedProduction = Arc<Mutex<FakeProduction>>;

impl FakeProduction {
    pub fn shared() -> SharedProduction {
        Arc::new(Mutex::new(Self {
            next_id: 100,
            ..Self::default()
        }))
    }
}

async fn fake_push(
    State(state): State<SharedProduction>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }

    let mut prod = state.lock().unwrap();
    if let Some((status, body)) = prod.reject_with.clone() {
        return (status, Json(body));
    }

    let name = body["version"]["app_version_name"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let confirm = body["confirm"].as_bool().unwrap_or(false);

    let target_id = match prod.existing.get(&name).copied() {
        Some(id) if !confirm => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "need_confirm": true,
                    "reason": format!("version '{name}' already exists"),
                    "target_app_version_name_id": id
                })),
            );
        }
        Some(id) => id,
        None => {
            let id = prod.next_id;
            prod.next_id += 1;
            prod.existing.insert(name, id);
            id
        }
    };

    prod.pushes.push(body);
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "target_app_version_name_id": target_id})),
    )
}

async fn fake_snapshot(
    State(state): State<SharedProduction>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let prod = state.lock().unwrap();
    let id = match (params.get("target_id"), params.get("name")) {
        (Some(id), _) => id.parse::<DbId>().ok(),
        (None, Some(name)) => prod.existing.get(name).copied(),
        _ => None,
    };
    match id.and_then(|id| prod.snapshots.get(&id)) {
        Some(payload) => (StatusCode::OK, Json(json!({"data": payload}))),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "no such version"}))),
    }
}

async fn fake_versions(State(state): State<SharedProduction>) -> Json<Value> {
    let prod = state.lock().unwrap();
    let mut versions: Vec<Value> = prod
        .existing
        .iter()
        .map(|(name, id)| json!({"id": id, "app_version_name": name, "location_name": ""}))
        .collect();
    versions.sort_by_key(|v| v["id"].as_i64());
    Json(json!({"data": versions}))
}

/// Serve the fake production API on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_production(state: SharedProduction) -> String {
    let router = Router::new()
        .route("/api/sync/push", post(fake_push))
        .route("/api/sync/snapshot", route_get(fake_snapshot))
        .route("/api/sync/versions", route_get(fake_versions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A snapshot payload as production would serve it.
pub fn snapshot_payload(name: &str, scenes: &[(DbId, &str)]) -> Value {
    let block = VersionBlock {
        app_version_name: name.to_string(),
        location_name: "Harbor".to_string(),
        ..VersionBlock::default()
    };
    json!({
        "version": block,
        "scenes": scenes
            .iter()
            .map(|(id, scene)| json!({"id": id, "name": scene, "image": format!("prod/{scene}.png")}))
            .collect::<Vec<_>>(),
        "banners": [{"id": 501, "image": "prod/banner.png", "title": "Welcome"}],
        "app_ui_fields": {"id": 9, "home_title_left": "Hello"}
    })
}

// ---------------------------------------------------------------------------
// In-memory blob store
// ---------------------------------------------------------------------------

/// [`BlobStore`] keeping uploaded bytes in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, file: &Path) -> Result<String, BlobError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| BlobError::Read {
            path: file.display().to_string(),
            message: e.to_string(),
        })?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        Ok(format!("memory://{key}?ttl={}", ttl.as_secs()))
    }
}
