use std::net::SocketAddr;
use std::sync::Arc;

use draftsync_api::config::ServerConfig;
use draftsync_api::router::build_app_router;
use draftsync_api::state::AppState;
use draftsync_remote::{BlobStore, ProductionClient, S3BlobStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "draftsync_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        deploy_mode = config.sync.deploy_mode.as_str(),
        remote_configured = config.sync.remote_configured(),
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = draftsync_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    draftsync_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    draftsync_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Production API client ---
    let production = config.sync.remote_credentials().map(|(url, key)| {
        let client = ProductionClient::new(url, key, config.sync.timeout())
            .expect("Failed to build production API client");
        tracing::info!(base_url = %client.base_url(), "Production API client ready");
        Arc::new(client)
    });

    // --- Blob store ---
    let blob_store: Option<Arc<dyn BlobStore>> = match &config.sync.blob_bucket {
        Some(bucket) => {
            let store = S3BlobStore::from_env(bucket.clone()).await;
            tracing::info!(bucket = %store.bucket(), "S3 blob store ready");
            Some(Arc::new(store) as Arc<dyn BlobStore>)
        }
        None => {
            tracing::warn!("BLOB_BUCKET not set; drafts with local media cannot be synced");
            None
        }
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        production,
        blob_store,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
