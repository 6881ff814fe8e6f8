//! Upload tree on the local filesystem.
//!
//! Files live at `<root>/<owner>/<stored_name>` and are served publicly
//! under `/static/<owner>/<stored_name>`.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use kmem_core::error::{AppError, ErrorKind};
use kmem_core::result::AppResult;

/// Public URL prefix of the upload root.
pub const STATIC_PREFIX: &str = "/static";

/// A stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Where and what an upload wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
    /// SHA-256 hex digest of the content.
    pub hash: String,
}

/// The upload root.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_upload_size: u64,
}

impl UploadStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// The root is kept in canonical form, so every path the store hands
    /// out names files the same way a walk of the tree does.
    pub async fn new(root: impl Into<PathBuf>, max_upload_size: u64) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload root: {}", root.display()),
                e,
            )
        })?;
        let root = fs::canonicalize(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve upload root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            max_upload_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding an owner's uploads.
    pub fn owner_dir(&self, owner: &str) -> PathBuf {
        self.root.join(owner)
    }

    /// Public path of a file under the upload root.
    pub fn relative_path(&self, path: &Path) -> String {
        public_path(&self.root, path)
    }

    /// Stream an upload to disk while hashing it.
    ///
    /// A stream longer than the configured maximum, or one that fails
    /// mid-way, leaves no file behind.
    pub async fn write_stream(
        &self,
        owner: &str,
        stored_name: &str,
        mut stream: ByteStream,
    ) -> AppResult<StoredUpload> {
        let dir = self.owner_dir(owner);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", dir.display()),
                e,
            )
        })?;

        let path = dir.join(stored_name);
        let mut file = fs::File::create(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create file: {}", path.display()),
                e,
            )
        })?;

        let mut hasher = Sha256::new();
        let mut size = 0u64;
        let written: AppResult<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Upload stream read error", e)
                })?;
                size += chunk.len() as u64;
                if size > self.max_upload_size {
                    return Err(AppError::validation(format!(
                        "Upload exceeds the maximum size of {} bytes",
                        self.max_upload_size
                    )));
                }
                hasher.update(&chunk);
                file.write_all(&chunk).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
                })?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))
        }
        .await;

        if let Err(e) = written {
            drop(file);
            self.remove(&path).await;
            return Err(e);
        }

        debug!(path = %path.display(), bytes = size, "Stored upload");
        Ok(StoredUpload {
            relative_path: self.relative_path(&path),
            path,
            size,
            hash: format!("{:x}", hasher.finalize()),
        })
    }

    /// Best-effort removal of a file. A missing file is not an error.
    pub async fn remove(&self, path: &Path) -> bool {
        remove_file_logged(path).await
    }
}

/// `/static` + `path` relative to `root`, with `/` separators.
pub fn public_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut public = String::from(STATIC_PREFIX);
    for component in relative.components() {
        public.push('/');
        public.push_str(&component.as_os_str().to_string_lossy());
    }
    public
}

/// Remove a file, logging failures. Returns whether the file is gone.
pub async fn remove_file_logged(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}
