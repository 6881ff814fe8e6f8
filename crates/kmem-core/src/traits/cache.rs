//! Cache store trait shared by request handlers and background jobs.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::result::AppResult;

/// Key-value cache with per-entry expiry and prefix invalidation.
///
/// Operations never fail and never block on other keys. A miss is a normal
/// outcome: callers fall back to the source of truth and repopulate.
pub trait CacheStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key is absent or expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Insert or overwrite a value, restarting its TTL.
    fn set(&self, key: &str, value: Value);

    /// Remove every gallery and stats entry belonging to `owner`.
    /// Returns the number of entries removed.
    fn invalidate_owner(&self, owner: &str) -> usize;

    /// Remove every entry whose key contains `"{namespace}:"`.
    /// Returns the number of entries removed.
    fn invalidate_namespace(&self, namespace: &str) -> usize;

    /// Number of entries currently held, expired or not.
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl dyn CacheStore {
    /// Get a typed value. A payload that no longer decodes counts as a miss.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Serialize and store a typed value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_value(value)?;
        self.set(key, json);
        Ok(())
    }
}
