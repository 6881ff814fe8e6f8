//! Shared test helpers for integration tests.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;

use kmem_api::{AppState, build_app};
use kmem_cache::MemoryCache;
use kmem_core::config::AppConfig;
use kmem_database::memory::{MemoryFileStore, MemoryUserStore};
use kmem_storage::{MediaRenderer, UploadStore};
use kmem_worker::WorkerPool;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    pub files: Arc<MemoryFileStore>,
    pub cache: Arc<MemoryCache>,
    pub dir: TempDir,
    _shutdown: watch::Sender<bool>,
    _workers: JoinSet<()>,
}

/// A collected response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pairs from every `Set-Cookie`, joined for a `Cookie` header.
    pub fn cookies(&self) -> String {
        self.set_cookies()
            .iter()
            .filter_map(|c| c.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-secret".to_string();
        config.auth.secure_cookies = false;
        config.storage.upload_root = dir.path().to_string_lossy().into_owned();
        config.worker.workers = 4;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let files = Arc::new(MemoryFileStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let cache = Arc::new(MemoryCache::new(config.cache.ttl()));
        let (pool, workers) = WorkerPool::start(config.worker.workers, shutdown_rx);
        let uploads = UploadStore::new(dir.path(), 10 * 1024 * 1024).await.unwrap();
        let renderer = Arc::new(MediaRenderer::from_config(&config.storage));

        let state = AppState::new(
            config,
            files.clone(),
            users,
            cache.clone(),
            uploads,
            pool,
            renderer,
        );

        Self {
            router: build_app(state),
            files,
            cache,
            dir,
            _shutdown: shutdown,
            _workers: workers,
        }
    }

    /// Send a request with an optional JSON body and `Cookie` header
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookies: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(COOKIE, cookies);
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    /// Upload raw bytes under `filename`
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>, cookies: &str) -> TestResponse {
        let uri = format!("/files/upload?filename={}", encode_filename(filename));
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(COOKIE, cookies)
            .body(Body::from(bytes))
            .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sign a user up and return their cookies
    pub async fn signup(&self, username: &str) -> String {
        let response = self
            .request(
                "POST",
                "/auth/signup",
                Some(serde_json::json!({ "username": username, "password": "password123" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.cookies()
    }

    /// Poll the first gallery page until `done` holds
    pub async fn wait_for_gallery(&self, cookies: &str, done: impl Fn(&Value) -> bool) -> Value {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let response = self.request("GET", "/files", None, Some(cookies)).await;
                if done(&response.body["data"]) {
                    return response.body["data"].clone();
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap()
    }
}

/// Base64 of the name, escaped for a query string
pub fn encode_filename(name: &str) -> String {
    STANDARD
        .encode(name.as_bytes())
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

/// A PNG whose bytes differ per `shade`
pub fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
