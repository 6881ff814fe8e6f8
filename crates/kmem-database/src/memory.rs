//! In-memory store implementations with the same semantics as the
//! PostgreSQL stores. Enabled with the `testing` feature.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use kmem_core::error::AppError;
use kmem_core::result::AppResult;
use kmem_entity::{
    File, FileCheckRecord, GalleryItem, GalleryQuery, GallerySort, InsertOutcome, NewFile,
    NewThumbnail, Thumbnail, UsageStats, User,
};

use crate::store::{FileStore, UserStore};

#[derive(Debug, Default)]
struct FileTables {
    next_file_id: i64,
    next_thumbnail_id: i64,
    files: BTreeMap<i64, File>,
    thumbnails: BTreeMap<i64, Thumbnail>,
}

impl FileTables {
    fn thumbnails_of(&self, file_id: i64) -> impl Iterator<Item = &Thumbnail> {
        self.thumbnails.values().filter(move |t| t.file_id == file_id)
    }

    fn gallery_matches<'a>(
        &'a self,
        owner: &'a str,
        query: &'a GalleryQuery,
    ) -> impl Iterator<Item = &'a File> + 'a {
        let search = query.effective_search().map(str::to_lowercase);
        self.files.values().filter(move |f| {
            f.owner == owner
                && !f.deleted
                && query.media.matches(&f.mime_type)
                && search
                    .as_deref()
                    .is_none_or(|term| f.original_name.to_lowercase().contains(term))
        })
    }
}

/// [`FileStore`] over in-process maps.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    tables: RwLock<FileTables>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record regardless of its deleted flag.
    pub async fn get(&self, id: i64) -> Option<File> {
        self.tables.read().await.files.get(&id).cloned()
    }

    /// Thumbnails registered for a file.
    pub async fn thumbnails(&self, file_id: i64) -> Vec<Thumbnail> {
        self.tables
            .read()
            .await
            .thumbnails_of(file_id)
            .cloned()
            .collect()
    }

    /// Overwrite the deletion timestamp of a soft-deleted record.
    pub async fn set_deleted_at(&self, id: i64, deleted_at: DateTime<Utc>) {
        if let Some(file) = self.tables.write().await.files.get_mut(&id) {
            file.deleted = true;
            file.deleted_at = Some(deleted_at);
        }
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn insert_file(&self, file: NewFile) -> AppResult<InsertOutcome> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables
            .files
            .values_mut()
            .find(|f| f.owner == file.owner && f.hash == file.hash)
        {
            if !existing.deleted {
                return Err(AppError::conflict(format!(
                    "File already exists as '{}'",
                    existing.original_name
                )));
            }
            existing.deleted = false;
            existing.deleted_at = None;
            return Ok(InsertOutcome::Restored(existing.clone()));
        }

        tables.next_file_id += 1;
        let record = File {
            id: tables.next_file_id,
            owner: file.owner,
            hash: file.hash,
            original_name: file.original_name,
            stored_name: file.stored_name,
            file_path: file.file_path,
            relative_path: file.relative_path,
            file_size: file.file_size,
            mime_type: file.mime_type,
            uploaded_at: Utc::now(),
            deleted: false,
            deleted_at: None,
        };
        tables.files.insert(record.id, record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn list_gallery(
        &self,
        owner: &str,
        query: &GalleryQuery,
    ) -> AppResult<Vec<GalleryItem>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<&File> = tables.gallery_matches(owner, query).collect();

        match query.sort {
            GallerySort::Date => {
                matches.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)))
            }
            GallerySort::Name => matches
                .sort_by(|a, b| a.original_name.cmp(&b.original_name).then(a.id.cmp(&b.id))),
        }

        let items = matches
            .into_iter()
            .skip(query.offset().max(0) as usize)
            .take(query.limit.max(0) as usize)
            .map(|f| GalleryItem {
                id: f.id,
                original_name: f.original_name.clone(),
                file_path: f.relative_path.clone(),
                mime_type: f.mime_type.clone(),
                uploaded_at: f.uploaded_at,
                thumbnails: tables
                    .thumbnails_of(f.id)
                    .map(|t| (t.size_name.clone(), t.relative_path.clone()))
                    .collect(),
            })
            .collect();

        Ok(items)
    }

    async fn count_gallery(&self, owner: &str, query: &GalleryQuery) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.gallery_matches(owner, query).count() as i64)
    }

    async fn soft_delete(&self, owner: &str, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.files.get_mut(&id) {
            Some(file) if file.owner == owner && !file.deleted => {
                file.deleted = true;
                file.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rename(&self, owner: &str, id: i64, new_name: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.files.get_mut(&id) {
            Some(file) if file.owner == owner && !file.deleted => {
                file.original_name = new_name.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn hard_delete(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.files.remove(&id);
        tables.thumbnails.retain(|_, t| t.file_id != id);
        Ok(())
    }

    async fn insert_thumbnail(&self, thumbnail: NewThumbnail) -> AppResult<Thumbnail> {
        let mut tables = self.tables.write().await;

        if !tables.files.contains_key(&thumbnail.file_id) {
            return Err(AppError::not_found(format!(
                "File {} not found",
                thumbnail.file_id
            )));
        }
        if tables
            .thumbnails_of(thumbnail.file_id)
            .any(|t| t.size_name == thumbnail.size_name)
        {
            return Err(AppError::conflict(format!(
                "Thumbnail '{}' already exists for file {}",
                thumbnail.size_name, thumbnail.file_id
            )));
        }

        tables.next_thumbnail_id += 1;
        let record = Thumbnail {
            id: tables.next_thumbnail_id,
            file_id: thumbnail.file_id,
            size_name: thumbnail.size_name,
            width: thumbnail.width,
            height: thumbnail.height,
            file_path: thumbnail.file_path,
            relative_path: thumbnail.relative_path,
            file_size: thumbnail.file_size,
            created_at: Utc::now(),
        };
        tables.thumbnails.insert(record.id, record.clone());
        Ok(record)
    }

    async fn all_files_for_check(&self) -> AppResult<Vec<FileCheckRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .map(|f| FileCheckRecord {
                id: f.id,
                file_path: f.file_path.clone(),
                deleted: f.deleted,
                deleted_at: f.deleted_at,
                thumbnail_paths: tables
                    .thumbnails_of(f.id)
                    .map(|t| t.file_path.clone())
                    .collect(),
            })
            .collect())
    }

    async fn usage(&self, owner: &str) -> AppResult<UsageStats> {
        let tables = self.tables.read().await;
        let (count, size) = tables
            .files
            .values()
            .filter(|f| f.owner == owner && !f.deleted)
            .fold((0i64, 0i64), |(count, size), f| (count + 1, size + f.file_size));
        Ok(UsageStats::new(owner, count, size))
    }
}

/// [`UserStore`] over an in-process map.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AppError::conflict(format!(
                "User '{username}' already exists"
            )));
        }
        let user = User {
            id: users.len() as i64 + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}
