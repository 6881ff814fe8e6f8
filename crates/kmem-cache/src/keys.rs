//! Cache key builders for all kmem cache entries.
//!
//! Centralising key construction keeps the owner prefixes used by
//! [`owner_prefixes`] in step with the keys that are actually written.

use kmem_entity::GalleryQuery;

/// Marker shared by every gallery page key.
pub const GALLERY_NAMESPACE: &str = "gallery";

// ── Gallery keys ───────────────────────────────────────────

/// Cache key for one page of an owner's gallery.
pub fn gallery_page(owner: &str, query: &GalleryQuery) -> String {
    format!(
        "{GALLERY_NAMESPACE}:{owner}:{}:{}:{}:{}:{}",
        query.page, query.limit, query.sort, query.media, query.search
    )
}

// ── Stats keys ─────────────────────────────────────────────

/// Cache key for an owner's usage statistics.
pub fn usage_stats(owner: &str) -> String {
    format!("{owner}:stats:usage")
}

// ── Invalidation ───────────────────────────────────────────

/// Key prefixes covering every entry that belongs to `owner`.
///
/// Both prefixes end in the separator so that owner `al` never matches
/// keys of owner `alice`.
pub fn owner_prefixes(owner: &str) -> [String; 2] {
    [
        format!("{GALLERY_NAMESPACE}:{owner}:"),
        format!("{owner}:stats:"),
    ]
}

/// Substring identifying keys in a namespace.
pub fn namespace_marker(namespace: &str) -> String {
    format!("{namespace}:")
}
