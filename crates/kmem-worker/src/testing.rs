//! Shared fixtures for job tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use kmem_cache::MemoryCache;
use kmem_core::error::AppError;
use kmem_core::result::AppResult;
use kmem_core::traits::cache::CacheStore;
use kmem_database::memory::MemoryFileStore;
use kmem_entity::{File, NewFile};
use kmem_storage::{ThumbnailRenderer, ThumbnailSize};

use crate::context::JobContext;

/// Writes a few bytes per thumbnail instead of decoding media.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    pub fail_sizes: HashSet<&'static str>,
    pub calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeRenderer {
    pub fn failing(sizes: &[&'static str]) -> Self {
        Self {
            fail_sizes: sizes.iter().copied().collect(),
            ..Default::default()
        }
    }

    async fn write(&self, kind: &str, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind.to_string(), dst.to_path_buf()));
        }
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dst, format!("{kind}:{}", size.name)).await?;
        if self.fail_sizes.contains(size.name) {
            return Err(AppError::external(format!("render of {} failed", size.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl ThumbnailRenderer for FakeRenderer {
    async fn render_image(&self, _src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        self.write("image", dst, size).await
    }

    async fn render_video(&self, _src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        self.write("video", dst, size).await
    }
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub files: Arc<MemoryFileStore>,
    pub cache: Arc<MemoryCache>,
    pub ctx: JobContext,
}

impl Fixture {
    pub fn new(renderer: FakeRenderer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(MemoryFileStore::new());
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(3600)));
        let ctx = JobContext::new(
            files.clone(),
            cache.clone() as Arc<dyn CacheStore>,
            Arc::new(renderer),
            dir.path(),
        );
        Self {
            dir,
            files,
            cache,
            ctx,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write an original to disk and register it.
    pub async fn upload(&self, owner: &str, stored_name: &str, mime: &str) -> File {
        use kmem_database::FileStore;

        let path = self.root().join(owner).join(stored_name);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, stored_name.as_bytes()).await.unwrap();

        self.files
            .insert_file(NewFile {
                owner: owner.to_string(),
                hash: format!("hash-{stored_name}"),
                original_name: format!("original-{stored_name}"),
                stored_name: stored_name.to_string(),
                file_path: path.to_string_lossy().into_owned(),
                relative_path: format!("/static/{owner}/{stored_name}"),
                file_size: stored_name.len() as i64,
                mime_type: mime.to_string(),
            })
            .await
            .unwrap()
            .into_file()
    }
}
