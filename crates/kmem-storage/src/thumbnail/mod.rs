//! Thumbnail presets, layout and rendering.
//!
//! Thumbnails sit next to their original:
//! `<dir>/thumbnails/<size>/<stored_name>` for images, with `.jpg`
//! appended for videos.

pub mod generator;

use std::path::{Path, PathBuf};

use kmem_entity::MediaKind;

pub use generator::{MediaRenderer, ThumbnailRenderer};

/// Directory name holding thumbnails beside the originals.
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// A named target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

/// The rendered sizes, smallest first.
pub const SIZES: [ThumbnailSize; 3] = [
    ThumbnailSize {
        name: "small",
        width: 150,
        height: 150,
    },
    ThumbnailSize {
        name: "medium",
        width: 300,
        height: 300,
    },
    ThumbnailSize {
        name: "large",
        width: 800,
        height: 600,
    },
];

/// Disk path of a thumbnail for the original at `file_path`.
pub fn thumbnail_path(
    file_path: &Path,
    stored_name: &str,
    kind: MediaKind,
    size: &ThumbnailSize,
) -> PathBuf {
    let dir = file_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(THUMBNAIL_DIR)
        .join(size.name);
    match kind {
        MediaKind::Image => dir.join(stored_name),
        MediaKind::Video => dir.join(format!("{stored_name}.jpg")),
    }
}

/// Where a thumbnail is rendered before it is moved to `dst`. Same
/// directory and extension, hidden name.
pub fn staging_path(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!(".staging-{name}"))
}
