//! Response DTOs.

use serde::{Deserialize, Serialize};

use kmem_entity::{GalleryItem, GalleryQuery};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// One gallery page. Cached as-is under the page's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPage {
    pub files: Vec<GalleryItem>,
    pub has_next: bool,
    pub next_page: i64,
}

impl GalleryPage {
    pub fn new(files: Vec<GalleryItem>, query: &GalleryQuery, total: i64) -> Self {
        Self {
            files,
            has_next: query.has_next(total),
            next_page: query.page + 1,
        }
    }
}

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
