//! Per-owner storage usage.

use serde::{Deserialize, Serialize};

/// Count and total size of an owner's live (not soft-deleted) files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub username: String,
    pub count: i64,
    pub size: i64,
    /// `size` formatted with binary units, e.g. `"1.5 MB"`.
    pub readable_size: String,
}

impl UsageStats {
    pub fn new(username: impl Into<String>, count: i64, size: i64) -> Self {
        Self {
            username: username.into(),
            count,
            size,
            readable_size: readable_size(size),
        }
    }
}

/// Format a byte count using 1024-based units.
pub fn readable_size(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < PREFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}
