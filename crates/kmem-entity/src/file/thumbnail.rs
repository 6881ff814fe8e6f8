//! Thumbnail entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A derived preview rendition of a file at a named size.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Thumbnail {
    pub id: i64,
    /// The file this thumbnail was derived from.
    pub file_id: i64,
    /// Preset name: `small`, `medium` or `large`.
    pub size_name: String,
    /// Target box width.
    pub width: i32,
    /// Target box height.
    pub height: i32,
    pub file_path: String,
    pub relative_path: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThumbnail {
    pub file_id: i64,
    pub size_name: String,
    pub width: i32,
    pub height: i32,
    pub file_path: String,
    pub relative_path: String,
    pub file_size: i64,
}
