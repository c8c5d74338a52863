//! deepscan-vault - image fingerprinting service
//!
//! Stores uploaded images, fingerprints them with SHA-256, optionally asks an
//! external detector whether they are AI-generated, and records every result.

use anyhow::{Context, Result};
use clap::Parser;
use deepscan_common::config::{RootFolderInitializer, TomlConfig};
use deepscan_vault::config::{ConfigOverrides, ServiceConfig};
use deepscan_vault::db::{init_database_pool, RecordStore, SqliteRecordStore};
use deepscan_vault::services::{HttpDetectorClient, ImageDetector, ScanService, UploadStore};
use deepscan_vault::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for deepscan-vault
#[derive(Parser, Debug)]
#[command(name = "deepscan-vault")]
#[command(about = "Image fingerprinting and AI-detection vault")]
#[command(version)]
struct Args {
    /// Root folder holding the database and uploads
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "DEEPSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DEEPSCAN_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// AI detector endpoint
    #[arg(long, env = "DEEPSCAN_DETECTOR_URL")]
    detector_url: Option<String>,

    /// Seconds to wait for the AI detector
    #[arg(long)]
    detector_timeout_secs: Option<u64>,

    /// Directory with the web UI served at `/`
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_folder: self.root_folder.clone(),
            host: self.host.clone(),
            port: self.port,
            detector_url: self.detector_url.clone(),
            detector_timeout_secs: self.detector_timeout_secs,
            public_dir: self.public_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read the bootstrap file before tracing exists so its log level applies
    let loaded = TomlConfig::try_load(args.config.as_deref());
    let toml = match &loaded {
        Ok((config, _)) => config.clone(),
        Err(_) => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting DeepScan Vault (deepscan-vault) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &loaded {
        Ok((_, source)) => source.log(),
        Err(e) => warn!("{} (using defaults)", e),
    }

    let config = ServiceConfig::resolve(args.overrides(), toml)?;

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database_pool(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };
    let records = Arc::new(SqliteRecordStore::new(pool));

    let detector = HttpDetectorClient::new(config.detector_url.clone(), config.detector_timeout)
        .context("Failed to build detector client")?;
    info!(
        "AI detector: {} (timeout {:?})",
        detector.endpoint(),
        config.detector_timeout
    );

    let store: Arc<dyn RecordStore> = records.clone();
    let detector: Arc<dyn ImageDetector> = Arc::new(detector);
    let scanner = Arc::new(ScanService::new(
        store.clone(),
        UploadStore::new(initializer.uploads_path()),
        detector,
    ));

    let state = AppState::new(
        scanner,
        store,
        config.max_upload_bytes,
        config.public_dir.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    info!("deepscan-vault listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    records.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
