//! # kmem-storage
//!
//! On-disk layout of uploads and their thumbnails, upload filename rules,
//! and the image/video thumbnail renderer.

pub mod local;
pub mod naming;
pub mod thumbnail;

pub use local::{ByteStream, StoredUpload, UploadStore};
pub use thumbnail::{MediaRenderer, SIZES, ThumbnailRenderer, ThumbnailSize};
