//! Reconciles file records with the upload tree and purges expired
//! soft-deletions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing;
use walkdir::WalkDir;

use kmem_cache::keys::GALLERY_NAMESPACE;
use kmem_entity::FileCheckRecord;
use kmem_storage::local::remove_file_logged;

use crate::context::JobContext;
use crate::job::{Job, JobExecutionError};

/// What one cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Records loaded for reconciliation
    pub records: usize,
    /// Files on disk with no record, removed
    pub orphans_removed: usize,
    /// Live records whose file was gone, dropped
    pub missing_dropped: usize,
    /// Soft-deleted records past retention, purged
    pub expired_purged: usize,
    /// Per-item failures that were logged and skipped
    pub errors: usize,
}

/// Handles the periodic cleanup pass
#[derive(Debug, Clone)]
pub struct CleanupJob {
    ctx: JobContext,
    retention: TimeDelta,
}

impl CleanupJob {
    /// Create a cleanup job that purges soft-deleted files older than `retention`.
    pub fn new(ctx: JobContext, retention: Duration) -> Self {
        Self {
            ctx,
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Whether a record deleted at `deleted_at` is past retention at `now`.
    pub fn is_expired(&self, deleted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(deleted_at) >= self.retention
    }

    /// Run one pass as if the current time were `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CleanupSummary, JobExecutionError> {
        tracing::info!("Running file cleanup");

        // Without the records nothing can be reconciled safely.
        let records = self.ctx.files.all_files_for_check().await?;

        let mut summary = CleanupSummary {
            records: records.len(),
            ..Default::default()
        };

        self.remove_orphans(&records, &mut summary).await;

        for record in &records {
            if record.deleted {
                self.purge_if_expired(record, now, &mut summary).await;
            } else {
                self.drop_if_missing(record, &mut summary).await;
            }
        }

        let invalidated = self.ctx.cache.invalidate_namespace(GALLERY_NAMESPACE);

        tracing::info!(
            records = summary.records,
            orphans_removed = summary.orphans_removed,
            missing_dropped = summary.missing_dropped,
            expired_purged = summary.expired_purged,
            errors = summary.errors,
            cache_entries_invalidated = invalidated,
            "File cleanup finished"
        );

        Ok(summary)
    }

    /// Remove every regular file under the upload root that no record
    /// (live or soft-deleted) refers to.
    async fn remove_orphans(&self, records: &[FileCheckRecord], summary: &mut CleanupSummary) {
        let known: Vec<PathBuf> = records
            .iter()
            .flat_map(|r| std::iter::once(&r.file_path).chain(r.thumbnail_paths.iter()))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();

        let root = self.ctx.upload_root.clone();
        let walked = tokio::task::spawn_blocking(move || find_unknown_files(&root, &known)).await;

        let (orphans, walk_errors) = match walked {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Upload tree walk panicked: {}", e);
                summary.errors += 1;
                return;
            }
        };
        summary.errors += walk_errors;

        for path in orphans {
            tracing::info!("Removing orphaned file: {}", path.display());
            if remove_file_logged(&path).await {
                summary.orphans_removed += 1;
            } else {
                summary.errors += 1;
            }
        }
    }

    async fn drop_if_missing(&self, record: &FileCheckRecord, summary: &mut CleanupSummary) {
        match tokio::fs::try_exists(&record.file_path).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.ctx.files.hard_delete(record.id).await {
                    tracing::warn!("Failed to drop record {} with missing file: {}", record.id, e);
                    summary.errors += 1;
                    return;
                }
                tracing::info!("Dropped record {} whose file {} is gone", record.id, record.file_path);
                remove_all(&record.thumbnail_paths).await;
                summary.missing_dropped += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to stat {}: {}", record.file_path, e);
                summary.errors += 1;
            }
        }
    }

    async fn purge_if_expired(
        &self,
        record: &FileCheckRecord,
        now: DateTime<Utc>,
        summary: &mut CleanupSummary,
    ) {
        let Some(deleted_at) = record.deleted_at else {
            tracing::warn!("Soft-deleted record {} has no deletion time", record.id);
            return;
        };
        if !self.is_expired(deleted_at, now) {
            return;
        }

        // Record before files; leftovers are reclaimed as orphans next pass.
        if let Err(e) = self.ctx.files.hard_delete(record.id).await {
            tracing::warn!("Failed to purge record {}: {}", record.id, e);
            summary.errors += 1;
            return;
        }

        remove_file_logged(Path::new(&record.file_path)).await;
        remove_all(&record.thumbnail_paths).await;
        summary.expired_purged += 1;
    }
}

async fn remove_all(paths: &[String]) {
    for path in paths {
        remove_file_logged(Path::new(path)).await;
    }
}

/// Resolve `path` through symlinks and `.`/`..`, or keep it as given when
/// it cannot be resolved.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Walk `root` and return regular files not in `known`, plus the number
/// of entries that could not be read.
///
/// Both sides are compared in canonical form, so a root given through a
/// symlink or a relative path still matches the recorded paths.
fn find_unknown_files(root: &Path, known: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let known: HashSet<PathBuf> = known.iter().map(|p| canonical(p)).collect();
    let mut unknown = Vec::new();
    let mut errors = 0;

    for entry in WalkDir::new(canonical(root)) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = canonical(entry.path());
                if !known.contains(&path) {
                    unknown.push(path);
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to read upload tree entry: {}", e);
                errors += 1;
            }
        }
    }

    (unknown, errors)
}

#[async_trait]
impl Job for CleanupJob {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let summary = self.run_at(Utc::now()).await?;
        Ok(serde_json::to_value(summary).map_err(kmem_core::AppError::from)?)
    }
}
