//! Persistence seams consumed by the worker jobs and HTTP handlers.

use async_trait::async_trait;

use kmem_core::result::AppResult;
use kmem_entity::{
    FileCheckRecord, GalleryItem, GalleryQuery, InsertOutcome, NewFile, NewThumbnail, Thumbnail,
    UsageStats, User,
};

/// File and thumbnail records.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Insert a file record, deduplicating by `(owner, hash)`.
    ///
    /// A soft-deleted record with the same hash is restored and returned as
    /// [`InsertOutcome::Restored`]. A live record with the same hash is a
    /// conflict.
    async fn insert_file(&self, file: NewFile) -> AppResult<InsertOutcome>;

    /// One page of the owner's live files with their thumbnails.
    async fn list_gallery(&self, owner: &str, query: &GalleryQuery)
    -> AppResult<Vec<GalleryItem>>;

    /// Number of live files matching the query filters.
    async fn count_gallery(&self, owner: &str, query: &GalleryQuery) -> AppResult<i64>;

    /// Soft-delete one of the owner's live files. Returns whether a row changed.
    async fn soft_delete(&self, owner: &str, id: i64) -> AppResult<bool>;

    /// Rename one of the owner's live files. Returns whether a row changed.
    async fn rename(&self, owner: &str, id: i64, new_name: &str) -> AppResult<bool>;

    /// Remove a record and its thumbnail records permanently.
    async fn hard_delete(&self, id: i64) -> AppResult<()>;

    /// Register a rendered thumbnail.
    async fn insert_thumbnail(&self, thumbnail: NewThumbnail) -> AppResult<Thumbnail>;

    /// Every record, deleted or not, with all thumbnail disk paths.
    async fn all_files_for_check(&self) -> AppResult<Vec<FileCheckRecord>>;

    /// Count and total size of the owner's live files.
    async fn usage(&self, owner: &str) -> AppResult<UsageStats>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
}
