//! kmem server: personal photo and video gallery.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use kmem_api::{AppState, build_app};
use kmem_cache::MemoryCache;
use kmem_core::config::AppConfig;
use kmem_core::error::AppError;
use kmem_database::{DatabasePool, PgFileStore, PgUserStore};
use kmem_storage::{MediaRenderer, UploadStore};
use kmem_worker::{JobContext, MaintenanceScheduler, WorkerPool};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load and validate configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("KMEM_ENV").unwrap_or_else(|_| "development".to_string());

    let config = AppConfig::load(&env)?;
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting kmem v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Upload root ──────────────────────────────────────
    let uploads = UploadStore::new(
        config.storage.upload_root(),
        config.storage.max_upload_size_bytes,
    )
    .await?;
    tracing::info!("Serving uploads from {}", uploads.root().display());

    // ── Step 2: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    db.migrate().await?;

    let files = Arc::new(PgFileStore::new(db.pool().clone()));
    let users = Arc::new(PgUserStore::new(db.pool().clone()));

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Cache + worker pool ──────────────────────────────
    let (cache, sweeper) = MemoryCache::start(&config.cache, shutdown_rx.clone());
    let (pool, mut workers) = WorkerPool::start(config.worker.workers, shutdown_rx.clone());
    let renderer = Arc::new(MediaRenderer::from_config(&config.storage));

    // ── Step 5: Maintenance scheduler ────────────────────────────
    let job_ctx = JobContext::new(
        files.clone(),
        cache.clone(),
        renderer.clone(),
        uploads.root(),
    );
    let mut scheduler =
        MaintenanceScheduler::new(pool.clone(), job_ctx, config.worker.clone()).await?;
    scheduler.register_cleanup().await?;
    scheduler.start().await?;

    // ── Step 6: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, files, users, cache, uploads, pool, renderer);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("kmem listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    // ── Step 7: Drain background work ────────────────────────────
    tracing::info!("Shutting down background tasks...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("{}", e);
    }

    let drained = tokio::time::timeout(grace, async {
        while let Some(res) = workers.join_next().await {
            if let Err(e) = res {
                tracing::warn!("Worker task ended abnormally: {}", e);
            }
        }
        if let Err(e) = sweeper.await {
            tracing::warn!("Cache sweeper ended abnormally: {}", e);
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!("Background tasks still running after {:?}; exiting anyway", grace);
    }

    db.close().await;
    tracing::info!("kmem stopped");
    served
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
