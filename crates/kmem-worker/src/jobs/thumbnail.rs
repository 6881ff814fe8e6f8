//! Renders and registers the preset thumbnails of one uploaded file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing;

use kmem_core::result::AppResult;
use kmem_entity::{File, MediaKind, NewThumbnail};
use kmem_storage::local::{public_path, remove_file_logged};
use kmem_storage::thumbnail::{SIZES, ThumbnailSize, staging_path, thumbnail_path};

use crate::context::JobContext;
use crate::job::{Job, JobExecutionError};

/// Generates small, medium and large thumbnails for a file
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    ctx: JobContext,
    file: File,
}

impl ThumbnailJob {
    pub fn new(ctx: JobContext, file: File) -> Self {
        Self { ctx, file }
    }

    /// Render one size beside its destination, register it, then move it
    /// into place. A failure at any step leaves `dst` as it was.
    async fn render_size(&self, kind: MediaKind, src: &Path, size: &ThumbnailSize) -> AppResult<()> {
        let dst = thumbnail_path(src, &self.file.stored_name, kind, size);
        let staged = staging_path(&dst);

        let rendered = match kind {
            MediaKind::Image => self.ctx.renderer.render_image(src, &staged, size).await,
            MediaKind::Video => self.ctx.renderer.render_video(src, &staged, size).await,
        };

        let outcome = match rendered {
            Ok(()) => self.register(&staged, &dst, size).await,
            Err(e) => Err(e),
        };
        if outcome.is_err() {
            remove_file_logged(&staged).await;
            return outcome;
        }

        tokio::fs::rename(&staged, &dst).await?;
        Ok(())
    }

    async fn register(&self, staged: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        let metadata = tokio::fs::metadata(staged).await?;

        self.ctx
            .files
            .insert_thumbnail(NewThumbnail {
                file_id: self.file.id,
                size_name: size.name.to_string(),
                width: size.width as i32,
                height: size.height as i32,
                file_path: dst.to_string_lossy().into_owned(),
                relative_path: public_path(&self.ctx.upload_root, dst),
                file_size: metadata.len() as i64,
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Job for ThumbnailJob {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let kind = self.file.media_kind().ok_or_else(|| {
            JobExecutionError::Unsupported(format!(
                "No thumbnails for file {} of type '{}'",
                self.file.id, self.file.mime_type
            ))
        })?;

        let src = PathBuf::from(&self.file.file_path);
        let mut rendered = Vec::with_capacity(SIZES.len());
        let mut failed = Vec::new();

        for size in &SIZES {
            match self.render_size(kind, &src, size).await {
                Ok(()) => rendered.push(size.name),
                Err(e) => {
                    tracing::warn!(
                        "Thumbnail '{}' for file {} failed: {}",
                        size.name,
                        self.file.id,
                        e
                    );
                    failed.push(size.name);
                }
            }
        }

        if !rendered.is_empty() {
            self.ctx.cache.invalidate_owner(&self.file.owner);
        }

        if !failed.is_empty() {
            return Err(JobExecutionError::Failed(format!(
                "{} of {} thumbnail sizes failed for file {}: {}",
                failed.len(),
                SIZES.len(),
                self.file.id,
                failed.join(", ")
            )));
        }

        Ok(json!({
            "file_id": self.file.id,
            "rendered": rendered,
        }))
    }
}
