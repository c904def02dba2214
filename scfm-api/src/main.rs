//! scfm-api - SCF Music distribution backend
//!
//! Resolves config and root folder, opens storage, resumes distribution for
//! approved releases and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scfm_api::services::review;
use scfm_api::{build_router, AppState};
use scfm_common::assets::AssetStore;
use scfm_common::config::{
    load_config, resolve_config_path, resolve_root_folder, StorageBackend,
};
use scfm_common::db::init_database;
use scfm_common::repository::{MemoryRepository, SqliteRepository};
use scfm_common::Repository;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "scfm-api")]
#[command(about = "SCF Music distribution backend")]
#[command(version)]
struct Args {
    /// Root folder for the database and uploaded assets (also SCFM_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (also SCFM_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SCFM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SCFM_PORT")]
    port: Option<u16>,

    /// Storage backend: sqlite or memory
    #[arg(long, env = "SCFM_BACKEND")]
    backend: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("scfm_api={0},scfm_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SCF Music API (scfm-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if config_path.exists() {
        info!("Config file: {}", config_path.display());
    } else {
        warn!("Config file {} not found, using defaults", config_path.display());
    }

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.backend {
        config.storage.backend = backend;
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let repo: Arc<dyn Repository> = match config.storage.backend {
        StorageBackend::Sqlite => {
            let db_path = config.database_path(&root_folder);
            info!("Database path: {}", db_path.display());
            let pool = match init_database(&db_path).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("Failed to open database: {}", e);
                    return Err(e.into());
                }
            };
            Arc::new(SqliteRepository::new(pool))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on exit");
            Arc::new(MemoryRepository::new())
        }
    };

    if config.admin_emails.is_empty() {
        warn!("No admin_emails configured; nobody can review releases");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let assets = AssetStore::new(&root_folder);
    let state = AppState::new(repo, assets, config);

    let resumed = review::resume_distribution(&state).await?;
    if resumed > 0 {
        info!("Resumed distribution for {} approved release(s)", resumed);
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("scfm-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
