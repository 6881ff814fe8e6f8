//! File and thumbnail store backed by PostgreSQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use kmem_core::error::{AppError, ErrorKind};
use kmem_core::result::AppResult;
use kmem_entity::{
    File, FileCheckRecord, GalleryItem, GalleryQuery, GallerySort, InsertOutcome, NewFile,
    NewThumbnail, Thumbnail, UsageStats,
};

use super::is_unique_violation;
use crate::store::FileStore;

/// PostgreSQL implementation of [`FileStore`].
#[derive(Debug, Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GalleryRow {
    id: i64,
    original_name: String,
    file_path: String,
    mime_type: String,
    uploaded_at: DateTime<Utc>,
    thumbnails: Json<BTreeMap<String, String>>,
}

impl From<GalleryRow> for GalleryItem {
    fn from(row: GalleryRow) -> Self {
        Self {
            id: row.id,
            original_name: row.original_name,
            file_path: row.file_path,
            mime_type: row.mime_type,
            uploaded_at: row.uploaded_at,
            thumbnails: row.thumbnails.0,
        }
    }
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the owner, liveness, media and search filters shared by the
/// gallery page and count queries.
fn push_gallery_filters(builder: &mut QueryBuilder<'_, Postgres>, owner: &str, query: &GalleryQuery) {
    builder.push(" WHERE f.deleted = FALSE AND f.owner = ");
    builder.push_bind(owner.to_string());

    if let Some(kind) = query.media.kind() {
        builder.push(" AND f.mime_type LIKE ");
        builder.push_bind(format!("{}%", kind.mime_prefix()));
    }

    if let Some(term) = query.effective_search() {
        builder.push(" AND f.original_name ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(term)));
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn insert_file(&self, file: NewFile) -> AppResult<InsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let existing = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner = $1 AND hash = $2 FOR UPDATE",
        )
        .bind(&file.owner)
        .bind(&file.hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up file hash", e))?;

        let outcome = match existing {
            Some(found) if found.deleted => {
                let restored = sqlx::query_as::<_, File>(
                    "UPDATE files SET deleted = FALSE, deleted_at = NULL WHERE id = $1 RETURNING *",
                )
                .bind(found.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to restore file", e)
                })?;
                InsertOutcome::Restored(restored)
            }
            Some(found) => {
                return Err(AppError::conflict(format!(
                    "File already exists as '{}'",
                    found.original_name
                )));
            }
            None => {
                let created = sqlx::query_as::<_, File>(
                    "INSERT INTO files (owner, hash, original_name, stored_name, file_path, \
                     relative_path, file_size, mime_type) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
                )
                .bind(&file.owner)
                .bind(&file.hash)
                .bind(&file.original_name)
                .bind(&file.stored_name)
                .bind(&file.file_path)
                .bind(&file.relative_path)
                .bind(file.file_size)
                .bind(&file.mime_type)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::conflict("File already exists")
                    } else {
                        AppError::with_source(ErrorKind::Database, "Failed to insert file", e)
                    }
                })?;
                InsertOutcome::Created(created)
            }
        };

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(outcome)
    }

    async fn list_gallery(
        &self,
        owner: &str,
        query: &GalleryQuery,
    ) -> AppResult<Vec<GalleryItem>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT f.id, f.original_name, f.relative_path AS file_path, f.mime_type, \
             f.uploaded_at, \
             COALESCE(json_object_agg(t.size_name, t.relative_path) \
             FILTER (WHERE t.size_name IS NOT NULL), '{}') AS thumbnails \
             FROM files f LEFT JOIN thumbnails t ON t.file_id = f.id",
        );
        push_gallery_filters(&mut builder, owner, query);

        builder.push(" GROUP BY f.id");
        builder.push(match query.sort {
            GallerySort::Date => " ORDER BY f.uploaded_at DESC, f.id DESC",
            GallerySort::Name => " ORDER BY f.original_name ASC, f.id ASC",
        });
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset());

        let rows = builder
            .build_query_as::<GalleryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list gallery", e))?;

        Ok(rows.into_iter().map(GalleryItem::from).collect())
    }

    async fn count_gallery(&self, owner: &str, query: &GalleryQuery) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM files f");
        push_gallery_filters(&mut builder, owner, query);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count gallery", e))
    }

    async fn soft_delete(&self, owner: &str, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET deleted = TRUE, deleted_at = NOW() \
             WHERE id = $1 AND owner = $2 AND deleted = FALSE",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn rename(&self, owner: &str, id: i64, new_name: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET original_name = $3 WHERE id = $1 AND owner = $2 AND deleted = FALSE",
        )
        .bind(id)
        .bind(owner)
        .bind(new_name)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn hard_delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge file record", e)
            })?;
        Ok(())
    }

    async fn insert_thumbnail(&self, thumbnail: NewThumbnail) -> AppResult<Thumbnail> {
        sqlx::query_as::<_, Thumbnail>(
            "INSERT INTO thumbnails (file_id, size_name, width, height, file_path, \
             relative_path, file_size) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(thumbnail.file_id)
        .bind(&thumbnail.size_name)
        .bind(thumbnail.width)
        .bind(thumbnail.height)
        .bind(&thumbnail.file_path)
        .bind(&thumbnail.relative_path)
        .bind(thumbnail.file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "Thumbnail '{}' already exists for file {}",
                    thumbnail.size_name, thumbnail.file_id
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to register thumbnail", e)
            }
        })
    }

    async fn all_files_for_check(&self) -> AppResult<Vec<FileCheckRecord>> {
        sqlx::query_as::<_, FileCheckRecord>(
            "SELECT f.id, f.file_path, f.deleted, f.deleted_at, \
             COALESCE(array_agg(t.file_path) FILTER (WHERE t.file_path IS NOT NULL), '{}') \
             AS thumbnail_paths \
             FROM files f LEFT JOIN thumbnails t ON t.file_id = f.id \
             GROUP BY f.id ORDER BY f.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load file records", e))
    }

    async fn usage(&self, owner: &str) -> AppResult<UsageStats> {
        let (count, size): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0)::BIGINT \
             FROM files WHERE owner = $1 AND deleted = FALSE",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute usage", e))?;

        Ok(UsageStats::new(owner, count, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_gallery_filters_bind_search_and_media() {
        let query = GalleryQuery {
            media: kmem_entity::MediaFilter::Video,
            search: "trip".to_string(),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM files f");
        push_gallery_filters(&mut builder, "alice", &query);

        let sql = builder.sql();
        assert!(sql.contains("f.owner = $1"));
        assert!(sql.contains("f.mime_type LIKE $2"));
        assert!(sql.contains("f.original_name ILIKE $3"));
    }

    #[test]
    fn test_short_search_adds_no_filter() {
        let query = GalleryQuery {
            search: "ab".to_string(),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM files f");
        push_gallery_filters(&mut builder, "alice", &query);

        assert!(!builder.sql().contains("ILIKE"));
    }
}
