//! Request DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use kmem_core::error::AppError;
use kmem_entity::{GalleryQuery, GallerySort, MediaFilter};

/// Default gallery page size.
pub const DEFAULT_LIMIT: i64 = 30;

/// Largest gallery page a client may request.
pub const MAX_LIMIT: i64 = 100;

/// Signup and login body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, max = 255, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Rename body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    #[validate(length(min = 1, max = 255, message = "New name must be 1 to 255 characters"))]
    pub new_name: String,
}

/// Check a body's field bounds, mapping failures to a validation error.
pub fn validated<T: Validate>(body: T) -> Result<T, AppError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    Ok(body)
}

/// `?filename=` of an upload, base64 of the URL-encoded name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub filename: String,
}

/// Raw gallery query parameters. Parsed by [`GalleryParams::into_query`]
/// so that bad values produce the usual JSON error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    #[serde(rename = "type")]
    pub media: Option<String>,
    #[serde(default)]
    pub search: String,
}

impl GalleryParams {
    pub fn into_query(self) -> Result<GalleryQuery, AppError> {
        let limit = parse_number(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        let page = parse_number(self.page.as_deref()).unwrap_or(0).max(0);

        let sort = match self.sort.as_deref().filter(|s| !s.is_empty()) {
            None | Some("date") => GallerySort::Date,
            Some("name") => GallerySort::Name,
            Some(other) => {
                return Err(AppError::validation(format!("Unknown sort '{other}'")));
            }
        };

        let media = match self.media.as_deref().filter(|s| !s.is_empty()) {
            None | Some("all") => MediaFilter::All,
            Some("image") => MediaFilter::Image,
            Some("video") => MediaFilter::Video,
            Some(other) => {
                return Err(AppError::validation(format!("Unknown type '{other}'")));
            }
        };

        Ok(GalleryQuery {
            page,
            limit,
            sort,
            media,
            search: self.search,
        })
    }
}

/// Missing or non-numeric values fall back to the default.
fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}
