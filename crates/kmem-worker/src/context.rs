//! Capabilities shared by all jobs.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use kmem_core::traits::cache::CacheStore;
use kmem_database::FileStore;
use kmem_storage::ThumbnailRenderer;

/// Handles a job captures at construction.
#[derive(Clone)]
pub struct JobContext {
    /// File and thumbnail records
    pub files: Arc<dyn FileStore>,
    /// Response cache to invalidate after changes
    pub cache: Arc<dyn CacheStore>,
    /// Thumbnail renderer
    pub renderer: Arc<dyn ThumbnailRenderer>,
    /// Root of the upload tree
    pub upload_root: PathBuf,
}

impl JobContext {
    pub fn new(
        files: Arc<dyn FileStore>,
        cache: Arc<dyn CacheStore>,
        renderer: Arc<dyn ThumbnailRenderer>,
        upload_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            files,
            cache,
            renderer,
            upload_root: upload_root.into(),
        }
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("upload_root", &self.upload_root)
            .finish_non_exhaustive()
    }
}
