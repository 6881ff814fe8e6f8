//! Reconciliation view of a file record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A file record (live or soft-deleted) with the disk paths of all of its
/// thumbnails, as consumed by the cleanup job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileCheckRecord {
    pub id: i64,
    pub file_path: String,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub thumbnail_paths: Vec<String>,
}
