//! Upload storage and media tooling configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Upload storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files. Served under `/static`.
    #[serde(default = "default_upload_root")]
    pub upload_root: String,
    /// Maximum upload size in bytes (default 2 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// ffmpeg executable used for video frame extraction.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    /// ffprobe executable used for video duration probing.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
}

impl StorageConfig {
    /// Upload root as a path.
    pub fn upload_root(&self) -> PathBuf {
        PathBuf::from(&self.upload_root)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            max_upload_size_bytes: default_max_upload(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
        }
    }
}

fn default_upload_root() -> String {
    "./uploads".to_string()
}

fn default_max_upload() -> u64 {
    2_147_483_648 // 2 GB
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}
