//! Background worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker pool and maintenance schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers in the pool.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Hours between cleanup runs. A run is also queued at startup.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_hours: u64,
    /// How long soft-deleted files are kept before purging, in weeks.
    #[serde(default = "default_retention_weeks")]
    pub retention_weeks: u32,
}

impl WorkerConfig {
    /// Interval between scheduled cleanup runs.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours * 3600)
    }

    /// Retention window for soft-deleted files.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_weeks) * 7 * 24 * 3600)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            cleanup_interval_hours: default_cleanup_interval(),
            retention_weeks: default_retention_weeks(),
        }
    }
}

fn default_workers() -> usize {
    16
}

fn default_cleanup_interval() -> u64 {
    24
}

fn default_retention_weeks() -> u32 {
    30
}
