//! TTL cache with hit counting and periodic half eviction.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use kmem_core::config::CacheConfig;
use kmem_core::traits::cache::CacheStore;

use crate::keys;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    hits: u64,
    expires_at: Instant,
}

/// What a single sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Entries dropped because their TTL had passed.
    pub expired: usize,
    /// Live entries dropped for having the fewest hits.
    pub evicted: usize,
}

/// In-memory [`CacheStore`].
///
/// Every write sets `expires_at = now + ttl` and resets the hit count.
/// Reads never extend the TTL.
#[derive(Debug)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create an empty cache without a sweeper.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Create a cache from configuration and start its sweeper.
    ///
    /// The sweeper exits once `shutdown` turns `true` or its sender is dropped.
    pub fn start(config: &CacheConfig, shutdown: watch::Receiver<bool>) -> (Arc<Self>, JoinHandle<()>) {
        let cache = Arc::new(Self::new(config.ttl()));
        let handle = Arc::clone(&cache).spawn_sweeper(config.sweep_interval(), shutdown);
        (cache, handle)
    }

    /// Run [`sweep`](Self::sweep) every `every` until shutdown.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;

            info!(interval_secs = every.as_secs(), "Cache sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = self.sweep();
                        info!(
                            expired = outcome.expired,
                            evicted = outcome.evicted,
                            remaining = self.entries.len(),
                            "Cache sweep completed"
                        );
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Cache sweeper stopped");
        })
    }

    /// Remove expired entries, then evict the lower half of the remainder
    /// ordered by ascending hit count.
    pub fn sweep(&self) -> SweepOutcome {
        let now = Instant::now();

        let mut expired = 0;
        self.entries.retain(|_, entry| {
            let keep = now < entry.expires_at;
            if !keep {
                expired += 1;
            }
            keep
        });

        let mut live: Vec<(String, u64, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.hits, entry.expires_at))
            .collect();
        live.sort_by_key(|(_, hits, _)| *hits);

        let mut evicted = 0;
        for (key, _, expires_at) in live.iter().take(live.len() / 2) {
            // Skip keys rewritten since the snapshot.
            if self
                .entries
                .remove_if(key, |_, entry| entry.expires_at == *expires_at)
                .is_some()
            {
                evicted += 1;
            }
        }

        SweepOutcome { expired, evicted }
    }

    /// Current hit count of a key, if present.
    pub fn hits(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.hits)
    }

    fn remove_where(&self, mut matches: impl FnMut(&str) -> bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let hit = matches(key);
            if hit {
                removed += 1;
            }
            !hit
        });
        removed
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();

        match self.entries.get_mut(key) {
            Some(mut entry) if now < entry.expires_at => {
                entry.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => return None,
        }

        // Expired. The shard guard is released above.
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        debug!(key, "Cache entry expired");
        None
    }

    fn set(&self, key: &str, value: Value) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                hits: 0,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn invalidate_owner(&self, owner: &str) -> usize {
        let prefixes = keys::owner_prefixes(owner);
        let removed = self.remove_where(|key| prefixes.iter().any(|p| key.starts_with(p.as_str())));
        debug!(owner, removed, "Invalidated owner cache entries");
        removed
    }

    fn invalidate_namespace(&self, namespace: &str) -> usize {
        let marker = keys::namespace_marker(namespace);
        let removed = self.remove_where(|key| key.contains(marker.as_str()));
        debug!(namespace, removed, "Invalidated cache namespace");
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_get_after_set_then_expire() {
        let cache = MemoryCache::new(TTL);
        cache.set("gallery:alice:0:30:date:all:", json!({"files": []}));
        assert_eq!(
            cache.get("gallery:alice:0:30:date:all:"),
            Some(json!({"files": []}))
        );

        tokio::time::advance(TTL).await;
        assert_eq!(cache.get("gallery:alice:0:30:date:all:"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_do_not_extend_ttl() {
        let cache = MemoryCache::new(TTL);
        cache.set("k", json!(1));

        tokio::time::advance(TTL / 2).await;
        assert!(cache.get("k").is_some());

        tokio::time::advance(TTL / 2).await;
        assert!(cache.get("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_resets_ttl_and_hits() {
        let cache = MemoryCache::new(TTL);
        cache.set("k", json!(1));
        cache.get("k");
        cache.get("k");
        assert_eq!(cache.hits("k"), Some(2));

        tokio::time::advance(TTL / 2).await;
        cache.set("k", json!(2));
        assert_eq!(cache.hits("k"), Some(0));

        tokio::time::advance(TTL / 2).await;
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_hit_count_is_monotonic() {
        let cache = MemoryCache::new(TTL);
        cache.set("k", json!("v"));
        for _ in 0..7 {
            cache.get("k");
        }
        assert_eq!(cache.hits("k"), Some(7));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_sweep_evicts_lower_half_by_hits() {
        let cache = MemoryCache::new(TTL);
        for i in 0..6u64 {
            let key = format!("k{i}");
            cache.set(&key, json!(i));
            for _ in 0..i {
                cache.get(&key);
            }
        }

        let outcome = cache.sweep();
        assert_eq!(outcome, SweepOutcome { expired: 0, evicted: 3 });
        for i in 0..3 {
            assert!(cache.hits(&format!("k{i}")).is_none());
        }
        for i in 3..6u64 {
            assert_eq!(cache.get(&format!("k{i}")), Some(json!(i)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_before_halving() {
        let cache = MemoryCache::new(TTL);
        cache.set("stale", json!(0));
        tokio::time::advance(TTL).await;

        for i in 0..4u64 {
            let key = format!("fresh{i}");
            cache.set(&key, json!(i));
            for _ in 0..i {
                cache.get(&key);
            }
        }

        let outcome = cache.sweep();
        assert_eq!(outcome, SweepOutcome { expired: 1, evicted: 2 });
        assert_eq!(cache.len(), 2);
        assert!(cache.hits("fresh2").is_some());
        assert!(cache.hits("fresh3").is_some());
    }

    #[test]
    fn test_sweep_single_entry_survives() {
        let cache = MemoryCache::new(TTL);
        cache.set("only", json!(null));
        assert_eq!(cache.sweep().evicted, 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_owner_scope() {
        let cache = MemoryCache::new(TTL);
        cache.set("gallery:alice:0:30:date:all:", json!(1));
        cache.set("alice:stats:usage", json!(2));
        cache.set("gallery:bob:0:30:date:all:", json!(3));
        cache.set("gallery:alicia:0:30:date:all:", json!(4));

        assert_eq!(cache.invalidate_owner("alice"), 2);
        assert!(cache.get("gallery:alice:0:30:date:all:").is_none());
        assert!(cache.get("alice:stats:usage").is_none());
        assert!(cache.get("gallery:bob:0:30:date:all:").is_some());
        assert!(cache.get("gallery:alicia:0:30:date:all:").is_some());
    }

    #[test]
    fn test_invalidate_namespace_clears_all_galleries() {
        let cache = MemoryCache::new(TTL);
        cache.set("gallery:alice:0:30:date:all:", json!(1));
        cache.set("gallery:bob:1:30:name:image:cat", json!(2));
        cache.set("alice:stats:usage", json!(3));

        assert_eq!(cache.invalidate_namespace(keys::GALLERY_NAMESPACE), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("alice:stats:usage").is_some());
    }

    #[test]
    fn test_typed_helpers() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Usage {
            count: i64,
        }

        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(TTL));
        cache.set_json("bob:stats:usage", &Usage { count: 3 }).unwrap();
        assert_eq!(
            cache.get_json::<Usage>("bob:stats:usage"),
            Some(Usage { count: 3 })
        );

        cache.set("bob:stats:usage", json!("not a usage object"));
        assert_eq!(cache.get_json::<Usage>("bob:stats:usage"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_and_set_same_key() {
        let cache = Arc::new(MemoryCache::new(TTL));
        let mut handles = Vec::new();
        for writer in 0..8u64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for _ in 0..200 {
                    cache.set("shared", json!(writer));
                    cache.get("shared");
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let value = cache.get("shared").and_then(|v| v.as_u64()).unwrap();
        assert!(value < 8);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval_and_stops_on_shutdown() {
        let config = CacheConfig {
            ttl_seconds: 60,
            sweep_interval_seconds: 120,
        };
        let (tx, rx) = watch::channel(false);
        let (cache, handle) = MemoryCache::start(&config, rx);

        cache.set("gallery:alice:0:30:date:all:", json!(1));
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(cache.is_empty());

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
