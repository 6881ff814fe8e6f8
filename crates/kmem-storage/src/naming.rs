//! Upload filename decoding and validation.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use kmem_core::error::AppError;
use kmem_core::result::AppResult;

/// Longest accepted filename, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

const FORBIDDEN: [&str; 10] = ["..", "/", "\\", ":", "*", "?", "\"", "<", ">", "|"];

/// Decode a filename sent as base64 of its URL-escaped form.
pub fn decode_filename(encoded: &str) -> AppResult<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::validation(format!("Filename is not valid base64: {e}")))?;
    let escaped = String::from_utf8(bytes)
        .map_err(|_| AppError::validation("Filename is not valid UTF-8"))?;

    // Query unescaping treats `+` as a space.
    let escaped = escaped.replace('+', " ");
    urlencoding::decode(&escaped)
        .map(|name| name.into_owned())
        .map_err(|e| AppError::validation(format!("Filename is not valid URL encoding: {e}")))
}

/// Reject empty, overlong, hidden or path-like filenames.
pub fn validate_filename(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::validation("Filename is empty"));
    }
    if name.len() > MAX_FILENAME_LEN {
        return Err(AppError::validation(format!(
            "Filename too long (max {MAX_FILENAME_LEN} bytes)"
        )));
    }
    if let Some(bad) = FORBIDDEN.iter().find(|pattern| name.contains(*pattern)) {
        return Err(AppError::validation(format!(
            "Filename contains invalid character: {bad}"
        )));
    }
    if name.starts_with('.') {
        return Err(AppError::validation("Hidden files are not allowed"));
    }
    Ok(())
}

/// Lowercased extension of a filename, with the leading dot.
fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// MIME type for an accepted upload extension.
pub fn allowed_mime_type(name: &str) -> AppResult<&'static str> {
    let ext = extension(name).unwrap_or_default();
    let mime = match ext.as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".mp4" => "video/mp4",
        ".avi" => "video/avi",
        ".mov" => "video/quicktime",
        ".mkv" => "video/x-matroska",
        ".webm" => "video/webm",
        _ => {
            return Err(AppError::validation(format!(
                "File type not allowed: {}",
                if ext.is_empty() { "(none)" } else { &ext }
            )));
        }
    };
    Ok(mime)
}

/// A collision-free on-disk name that keeps the original extension.
pub fn unique_stored_name(original_name: &str) -> String {
    let id = Uuid::now_v7();
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// A decoded, validated upload name with its MIME type and stored name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: &'static str,
}

/// Decode, validate and classify an encoded upload filename.
pub fn process_filename(encoded: &str) -> AppResult<UploadName> {
    let original_name = decode_filename(encoded)?;
    validate_filename(&original_name)?;
    let mime_type = allowed_mime_type(&original_name)?;
    let stored_name = unique_stored_name(&original_name);

    Ok(UploadName {
        original_name,
        stored_name,
        mime_type,
    })
}
