//! Cache Facade
//!
//! `Cache` is a plain configuration value. Opening it yields a running
//! `Connection` that owns the shard table, the eviction strategy and the
//! background tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::{Counters, Entry, Expiry, Reclaim, ShardTable, Stats};
use crate::checkpoint::{self, CheckpointConfig, CheckpointReport};
use crate::error::{CacheError, Result};
use crate::eviction::{EvictionMode, EvictionStrategy};
use crate::tasks::{spawn_checkpoint_task, spawn_reclaim_task};

// == Cache ==
/// Configuration for a cache. Building one allocates nothing and starts
/// no background work; see `Cache::open`.
#[derive(Debug, Clone)]
pub struct Cache {
    default_ttl: Duration,
    gc_interval: Duration,
    eviction: EvictionMode,
    checkpoint: Option<CheckpointConfig>,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache configuration.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL applied by `Connection::write`; zero never expires
    /// * `gc_interval` - Period of the background reclaim loop
    pub fn new(default_ttl: Duration, gc_interval: Duration) -> Self {
        Self {
            default_ttl,
            gc_interval,
            eviction: EvictionMode::default(),
            checkpoint: None,
        }
    }

    pub fn with_eviction(mut self, eviction: EvictionMode) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: CheckpointConfig) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn gc_interval(&self) -> Duration {
        self.gc_interval
    }

    pub fn eviction(&self) -> EvictionMode {
        self.eviction
    }

    pub fn checkpoint(&self) -> Option<&CheckpointConfig> {
        self.checkpoint.as_ref()
    }

    // == Open ==
    /// Allocates an empty shard table and starts background eviction.
    ///
    /// With checkpointing configured, the latest checkpoint is restored
    /// before this returns and the checkpoint timer is started. Shards that
    /// fail to restore start empty; they never fail the open.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn open(&self, name: &str) -> Result<Connection> {
        if self.gc_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "gc interval must be greater than zero".to_string(),
            ));
        }
        if let Some(cfg) = &self.checkpoint {
            if cfg.interval.is_zero() {
                return Err(CacheError::InvalidConfig(
                    "checkpoint interval must be greater than zero".to_string(),
                ));
            }
        }

        let shared = Arc::new(Shared::new(self.default_ttl, self.eviction));
        if let Some(cfg) = &self.checkpoint {
            checkpoint::restore(
                &shared.table,
                shared.strategy.as_ref(),
                cfg.store.as_ref(),
                &cfg.location,
            )
            .await;
        }

        let shutdown = CancellationToken::new();
        let mut tasks = vec![spawn_reclaim_task(
            shared.clone(),
            self.gc_interval,
            shutdown.child_token(),
        )];
        if let Some(cfg) = &self.checkpoint {
            tasks.push(spawn_checkpoint_task(
                shared.clone(),
                cfg.clone(),
                shutdown.child_token(),
            ));
        }

        info!(
            "Opened connection {}: default_ttl={:?}, gc_interval={:?}, eviction={}",
            name,
            self.default_ttl,
            self.gc_interval,
            shared.strategy.name()
        );

        Ok(Connection {
            name: name.to_string(),
            shared,
            checkpoint: self.checkpoint.clone(),
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }
}

// == Shared State ==
/// State reachable from both callers and background tasks.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) table: ShardTable,
    pub(crate) strategy: Box<dyn EvictionStrategy>,
    pub(crate) counters: Counters,
    pub(crate) default_ttl: Duration,
    pub(crate) closed: AtomicBool,
}

impl Shared {
    pub(crate) fn new(default_ttl: Duration, eviction: EvictionMode) -> Self {
        Self {
            table: ShardTable::new(),
            strategy: eviction.build(),
            counters: Counters::new(),
            default_ttl,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    // == Write ==
    /// Stores the entry, then settles eviction bookkeeping against it. The
    /// shard lock is released before the strategy is called.
    pub(crate) fn write(&self, key: &[u8], value: Bytes, ttl: Duration) {
        let expires_at = Expiry::after(ttl);
        self.table
            .shard_for(key)
            .set(key.to_vec(), Entry::with_expiry(value, expires_at));
        self.strategy.sync(&self.table, key, Some(expires_at));
    }

    // == Read ==
    /// Returns the live value for `key`, evicting it if it has expired.
    pub(crate) fn read(&self, key: &[u8]) -> Result<Bytes> {
        let shard = self.table.shard_for(key);
        let now = Expiry::now();
        match shard.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.counters.record_hit();
                Ok(entry.value)
            }
            Some(_) => {
                if shard.remove_if_expired(key, now) == Reclaim::Removed {
                    self.counters.record_lazy_eviction();
                }
                self.counters.record_miss();
                Err(CacheError::NotFound)
            }
            None => {
                self.counters.record_miss();
                Err(CacheError::NotFound)
            }
        }
    }

    pub(crate) fn delete(&self, key: &[u8]) -> bool {
        let removed = self.table.shard_for(key).delete(key);
        self.strategy.sync(&self.table, key, None);
        removed.is_some_and(|entry| !entry.is_expired())
    }

    /// One pass of the active reclaim strategy.
    pub(crate) fn reclaim_expired(&self) -> usize {
        let removed = self.strategy.tick(&self.table, Expiry::now());
        self.counters.record_reclaimed(removed);
        removed
    }

    pub(crate) fn stats(&self) -> Stats {
        self.counters
            .snapshot(self.table.size(), self.strategy.tracked())
    }
}

// == Connection ==
/// A live cache instance.
///
/// `write`, `read`, `delete` and `stats` are synchronous and may be called
/// from any number of threads through a shared reference. After `close`
/// they fail with `CacheError::Closed`.
#[derive(Debug)]
pub struct Connection {
    name: String,
    shared: Arc<Shared>,
    checkpoint: Option<CheckpointConfig>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_ttl(&self) -> Duration {
        self.shared.default_ttl
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Writes `value` with the connection's default TTL.
    pub fn write(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) -> Result<()> {
        self.write_ttl(key, value, self.shared.default_ttl)
    }

    /// Writes `value` with an explicit TTL. A zero TTL never expires.
    ///
    /// Overwrites replace value and expiry together.
    pub fn write_ttl(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        ttl: Duration,
    ) -> Result<()> {
        self.shared.ensure_open()?;
        self.shared.write(key.as_ref(), value.into(), ttl);
        Ok(())
    }

    /// Reads the value for `key`.
    ///
    /// Returns `CacheError::NotFound` for absent keys and for keys whose
    /// TTL has elapsed, even if the reclaim loop has not removed them yet.
    pub fn read(&self, key: impl AsRef<[u8]>) -> Result<Bytes> {
        self.shared.ensure_open()?;
        self.shared.read(key.as_ref())
    }

    /// Removes `key`. Returns whether a live entry was removed.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.shared.ensure_open()?;
        Ok(self.shared.delete(key.as_ref()))
    }

    /// Approximate statistics; see `Stats` for the consistency model.
    pub fn stats(&self) -> Result<Stats> {
        self.shared.ensure_open()?;
        Ok(self.shared.stats())
    }

    /// Writes a checkpoint now, outside the periodic timer.
    pub async fn record_checkpoint(&self) -> Result<CheckpointReport> {
        self.shared.ensure_open()?;
        let cfg = self.checkpoint_config()?;
        Ok(checkpoint::record(&self.shared.table, cfg.store.as_ref(), &cfg.location).await)
    }

    /// Reloads every shard from the latest checkpoint.
    pub async fn restore_checkpoint(&self) -> Result<CheckpointReport> {
        self.shared.ensure_open()?;
        let cfg = self.checkpoint_config()?;
        Ok(checkpoint::restore(
            &self.shared.table,
            self.shared.strategy.as_ref(),
            cfg.store.as_ref(),
            &cfg.location,
        )
        .await)
    }

    fn checkpoint_config(&self) -> Result<&CheckpointConfig> {
        self.checkpoint
            .as_ref()
            .ok_or_else(|| CacheError::InvalidConfig("checkpointing is not configured".to_string()))
    }

    // == Close ==
    /// Stops the background tasks and waits for them to exit.
    ///
    /// Records a final checkpoint if configured, then releases all entries.
    /// A second call returns `CacheError::Closed`.
    pub async fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Err(CacheError::Closed);
        }

        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Background task for {} ended abnormally: {}", self.name, e);
            }
        }

        if let Some(cfg) = self.checkpoint.as_ref().filter(|cfg| cfg.checkpoint_on_close) {
            checkpoint::record(&self.shared.table, cfg.store.as_ref(), &cfg.location).await;
        }

        self.shared.strategy.on_close();
        self.shared.table.clear();
        info!("Closed connection {}", self.name);
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
