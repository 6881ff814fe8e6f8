//! In-process cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gallery and usage-stat cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of an entry from its last write, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Interval between expiry/eviction sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    3600
}
