//! # kmem-entity
//!
//! Domain entity models for kmem. Every struct in this crate represents a
//! database row or a domain value object. Database rows additionally derive
//! `sqlx::FromRow`.

pub mod file;
pub mod media;
pub mod usage;
pub mod user;

pub use file::{
    File, FileCheckRecord, GalleryItem, GalleryQuery, GallerySort, InsertOutcome, MediaFilter,
    NewFile, NewThumbnail, Thumbnail,
};
pub use media::MediaKind;
pub use usage::UsageStats;
pub use user::User;
