//! Thumbnail rendering for images and videos.

use std::fmt::Debug;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tokio::process::Command;
use tracing::{debug, warn};

use kmem_core::config::StorageConfig;
use kmem_core::error::{AppError, ErrorKind};
use kmem_core::result::AppResult;

use super::ThumbnailSize;

/// Duration assumed when a video cannot be probed, in seconds.
pub const DEFAULT_VIDEO_DURATION: f64 = 20.0;

/// Earliest frame taken from a video, in seconds.
pub const MIN_SEEK_SECONDS: f64 = 5.0;

/// Renders one thumbnail file from an original.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync + Debug + 'static {
    /// Fit the image inside the box, preserving aspect ratio.
    async fn render_image(&self, src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()>;

    /// Extract one frame, scaled and padded to exactly the box.
    async fn render_video(&self, src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()>;
}

/// Renderer using the `image` crate and the ffmpeg/ffprobe executables.
#[derive(Debug, Clone)]
pub struct MediaRenderer {
    ffmpeg: String,
    ffprobe: String,
}

impl MediaRenderer {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.ffmpeg_path, &config.ffprobe_path)
    }

    /// Video duration in seconds, or [`DEFAULT_VIDEO_DURATION`] when
    /// probing fails.
    pub async fn probe_duration(&self, src: &Path) -> f64 {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(src)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => parse_duration(&String::from_utf8_lossy(&out.stdout))
                .unwrap_or_else(|| {
                    debug!(src = %src.display(), "ffprobe returned no duration");
                    DEFAULT_VIDEO_DURATION
                }),
            Ok(out) => {
                debug!(src = %src.display(), status = %out.status, "ffprobe failed");
                DEFAULT_VIDEO_DURATION
            }
            Err(e) => {
                warn!(src = %src.display(), error = %e, "Failed to run ffprobe");
                DEFAULT_VIDEO_DURATION
            }
        }
    }
}

/// Parse ffprobe's bare duration output.
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Where to take the frame from: 30% in, but never before 5 seconds.
pub fn seek_point(duration: f64) -> f64 {
    (duration * 0.3).max(MIN_SEEK_SECONDS)
}

fn scale_and_pad(size: &ThumbnailSize) -> String {
    let (w, h) = (size.width, size.height);
    format!("scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2")
}

async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}

/// Decode, shrink to fit and encode. Never upscales.
fn fit_image(src: &Path, dst: &Path, width: u32, height: u32) -> AppResult<()> {
    let img = image::open(src).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to decode image: {}", src.display()),
            e,
        )
    })?;

    let fitted = if img.width() <= width && img.height() <= height {
        img
    } else {
        img.resize(width, height, FilterType::Lanczos3)
    };

    // JPEG has no alpha channel.
    let fitted = match ImageFormat::from_path(dst) {
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgb8(fitted.to_rgb8()),
        _ => fitted,
    };

    fitted.save(dst).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to encode thumbnail: {}", dst.display()),
            e,
        )
    })
}

#[async_trait]
impl ThumbnailRenderer for MediaRenderer {
    async fn render_image(&self, src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        ensure_parent(dst).await?;

        let (src_owned, dst_owned) = (src.to_path_buf(), dst.to_path_buf());
        let (width, height) = (size.width, size.height);
        tokio::task::spawn_blocking(move || fit_image(&src_owned, &dst_owned, width, height))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e))??;

        debug!(src = %src.display(), dst = %dst.display(), size = size.name, "Rendered image thumbnail");
        Ok(())
    }

    async fn render_video(&self, src: &Path, dst: &Path, size: &ThumbnailSize) -> AppResult<()> {
        ensure_parent(dst).await?;

        let seek = seek_point(self.probe_duration(src).await);
        let output = Command::new(&self.ffmpeg)
            .arg("-ss")
            .arg(format!("{seek:.1}"))
            .arg("-i")
            .arg(src)
            .args(["-vframes", "1", "-vf"])
            .arg(scale_and_pad(size))
            .arg("-y")
            .arg(dst)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::External,
                    format!("Failed to run {}", self.ffmpeg),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" | ");
            return Err(AppError::external(format!(
                "ffmpeg exited with {}: {tail}",
                output.status
            )));
        }

        debug!(src = %src.display(), dst = %dst.display(), seek, size = size.name, "Rendered video thumbnail");
        Ok(())
    }
}
