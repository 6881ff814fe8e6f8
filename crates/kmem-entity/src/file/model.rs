//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::media::MediaKind;

/// An uploaded file owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: i64,
    /// Username of the owner.
    pub owner: String,
    /// SHA-256 hex digest of the content.
    pub hash: String,
    /// Name the file was uploaded with (or renamed to).
    pub original_name: String,
    /// Collision-free name on disk.
    pub stored_name: String,
    /// Absolute or root-relative path on disk.
    pub file_path: String,
    /// Public path under `/static`.
    pub relative_path: String,
    /// File size in bytes.
    pub file_size: i64,
    /// MIME type derived from the extension at upload.
    pub mime_type: String,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// When the file was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl File {
    /// Media category of this file, if it is an image or a video.
    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub owner: String,
    pub hash: String,
    pub original_name: String,
    pub stored_name: String,
    pub file_path: String,
    pub relative_path: String,
    pub file_size: i64,
    pub mime_type: String,
}

/// Result of inserting a file whose content may already be known.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// A new record was created.
    Created(File),
    /// The owner had soft-deleted identical content; that record was
    /// restored instead and the new bytes are redundant.
    Restored(File),
}

impl InsertOutcome {
    pub fn file(&self) -> &File {
        match self {
            Self::Created(file) | Self::Restored(file) => file,
        }
    }

    pub fn into_file(self) -> File {
        match self {
            Self::Created(file) | Self::Restored(file) => file,
        }
    }
}
