//! Coarse media categories used for filtering and thumbnail dispatch.

use serde::{Deserialize, Serialize};

/// Media category derived from a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Returns `None` for anything that is neither
    /// an image nor a video.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// MIME prefix matched by gallery filters.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Video => "video/",
        }
    }
}
