//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use kmem_auth::{CredentialPolicy, JwtDecoder, JwtEncoder, PasswordHasher};
use kmem_core::config::AppConfig;
use kmem_core::traits::cache::CacheStore;
use kmem_database::{FileStore, UserStore};
use kmem_storage::{ThumbnailRenderer, UploadStore};
use kmem_worker::{JobContext, WorkerPool};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheap handles.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// File and thumbnail records
    pub files: Arc<dyn FileStore>,
    /// User accounts
    pub users: Arc<dyn UserStore>,
    /// Response cache
    pub cache: Arc<dyn CacheStore>,
    /// Upload tree on disk
    pub uploads: Arc<UploadStore>,
    /// Background worker pool
    pub pool: WorkerPool,
    /// Capabilities handed to thumbnail jobs
    pub jobs: JobContext,

    // ── Auth ─────────────────────────────────────────────────
    pub jwt_encoder: Arc<JwtEncoder>,
    pub jwt_decoder: Arc<JwtDecoder>,
    pub password_hasher: Arc<PasswordHasher>,
    pub credentials: Arc<CredentialPolicy>,
}

impl AppState {
    /// Assemble the state. Auth helpers are derived from `config.auth`.
    pub fn new(
        config: AppConfig,
        files: Arc<dyn FileStore>,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn CacheStore>,
        uploads: UploadStore,
        pool: WorkerPool,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Self {
        let jobs = JobContext::new(
            Arc::clone(&files),
            Arc::clone(&cache),
            renderer,
            uploads.root(),
        );

        Self {
            jwt_encoder: Arc::new(JwtEncoder::new(&config.auth)),
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            password_hasher: Arc::new(PasswordHasher::new()),
            credentials: Arc::new(CredentialPolicy::new(&config.auth)),
            config: Arc::new(config),
            files,
            users,
            cache,
            uploads: Arc::new(uploads),
            pool,
            jobs,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("uploads", &self.uploads)
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}
