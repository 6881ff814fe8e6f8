//! Gallery listing query and result types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// Minimum search term length before a search filter applies.
pub const MIN_SEARCH_LEN: usize = 3;

/// Gallery ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GallerySort {
    /// Newest upload first.
    #[default]
    Date,
    /// Alphabetical by original name.
    Name,
}

impl fmt::Display for GallerySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// Gallery media filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    #[default]
    All,
    Image,
    Video,
}

impl MediaFilter {
    /// The media kind to restrict to, if any.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::All => None,
            Self::Image => Some(MediaKind::Image),
            Self::Video => Some(MediaKind::Video),
        }
    }

    /// Whether a MIME type passes this filter.
    pub fn matches(&self, mime_type: &str) -> bool {
        match self.kind() {
            None => true,
            Some(kind) => MediaKind::from_mime(mime_type) == Some(kind),
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// One page of an owner's gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    /// Zero-based page index.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    pub sort: GallerySort,
    pub media: MediaFilter,
    /// Raw search term as supplied by the client.
    pub search: String,
}

impl GalleryQuery {
    /// Row offset of this page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.limit)
    }

    /// The search term, if long enough to apply.
    pub fn effective_search(&self) -> Option<&str> {
        let term = self.search.trim();
        (term.chars().count() >= MIN_SEARCH_LEN).then_some(term)
    }

    /// Whether another page follows, given the total matching count.
    pub fn has_next(&self, total: i64) -> bool {
        (self.page + 1).saturating_mul(self.limit) < total
    }
}

impl Default for GalleryQuery {
    fn default() -> Self {
        Self {
            page: 0,
            limit: 30,
            sort: GallerySort::Date,
            media: MediaFilter::All,
            search: String::new(),
        }
    }
}

/// A file as shown in a gallery page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: i64,
    pub original_name: String,
    /// Public path of the original under `/static`.
    pub file_path: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    /// Thumbnail public paths keyed by size name.
    pub thumbnails: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_search_is_ignored() {
        let mut query = GalleryQuery {
            search: "ab".to_string(),
            ..Default::default()
        };
        assert_eq!(query.effective_search(), None);

        query.search = " abc ".to_string();
        assert_eq!(query.effective_search(), Some("abc"));
    }

    #[test]
    fn test_has_next() {
        let query = GalleryQuery {
            page: 1,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 10);
        assert!(query.has_next(21));
        assert!(!query.has_next(20));
    }

    #[test]
    fn test_media_filter() {
        assert!(MediaFilter::All.matches("application/octet-stream"));
        assert!(MediaFilter::Image.matches("image/png"));
        assert!(!MediaFilter::Image.matches("video/mp4"));
    }
}
