//! Configuration Module
//!
//! Loads cache settings from environment variables for the daemon binary.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::checkpoint::{CheckpointConfig, FsObjectStore};
use crate::eviction::EvictionMode;

/// Daemon configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default TTL in milliseconds for `write`; 0 never expires
    pub default_ttl_ms: u64,
    /// Background reclaim interval in milliseconds
    pub gc_interval_ms: u64,
    /// Active reclaim strategy
    pub eviction: EvictionMode,
    /// Directory receiving checkpoints; checkpointing is off when unset
    pub checkpoint_dir: Option<PathBuf>,
    /// Interval between checkpoints in seconds
    pub checkpoint_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0, never expire)
    /// - `GC_INTERVAL_MS` - Reclaim frequency in milliseconds (default: 1000)
    /// - `EVICTION_STRATEGY` - `heap` or `sweep` (default: heap)
    /// - `CHECKPOINT_DIR` - Checkpoint directory (default: unset, disabled)
    /// - `CHECKPOINT_INTERVAL_SECS` - Checkpoint frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            gc_interval_ms: parse_var("GC_INTERVAL_MS").unwrap_or(defaults.gc_interval_ms),
            eviction: parse_var("EVICTION_STRATEGY").unwrap_or(defaults.eviction),
            checkpoint_dir: env::var("CHECKPOINT_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            checkpoint_interval_secs: parse_var("CHECKPOINT_INTERVAL_SECS")
                .unwrap_or(defaults.checkpoint_interval_secs),
        }
    }

    /// Builds the cache configuration these settings describe.
    ///
    /// Checkpoints go to `<checkpoint_dir>/<name>/shard-N`, with a final
    /// checkpoint on close.
    pub fn to_cache(&self, name: &str) -> Cache {
        let cache = Cache::new(
            Duration::from_millis(self.default_ttl_ms),
            Duration::from_millis(self.gc_interval_ms),
        )
        .with_eviction(self.eviction);

        match &self.checkpoint_dir {
            Some(dir) => cache.with_checkpoint(
                CheckpointConfig::new(
                    Arc::new(FsObjectStore::new(dir.clone())),
                    name,
                    Duration::from_secs(self.checkpoint_interval_secs),
                )
                .checkpoint_on_close(true),
            ),
            None => cache,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 0,
            gc_interval_ms: 1000,
            eviction: EvictionMode::PriorityQueue,
            checkpoint_dir: None,
            checkpoint_interval_secs: 60,
        }
    }
}
