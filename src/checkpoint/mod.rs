//! Checkpoint Module
//!
//! Snapshots shards to an `ObjectStore` and restores them at open.
//!
//! Each shard is one object named `shard-<index+1>`. A shard is encoded
//! under its own read lock, so every object is a consistent snapshot of
//! that shard; the set of objects is not a cross-shard atomic snapshot.
//! A failure on one shard is reported and never stops the others.

mod codec;
mod store;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{Expiry, ShardTable};
use crate::error::CheckpointError;
use crate::eviction::EvictionStrategy;

pub use codec::{deserialize_shard, serialize_shard};
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore};

// == Checkpoint Config ==
/// Where and how often a connection checkpoints itself.
#[derive(Clone)]
pub struct CheckpointConfig {
    /// Object store receiving shard snapshots
    pub store: Arc<dyn ObjectStore>,
    /// Bucket or directory grouping this cache's objects
    pub location: String,
    /// Time between periodic checkpoints
    pub interval: Duration,
    /// Record one last checkpoint when the connection closes
    pub checkpoint_on_close: bool,
}

impl CheckpointConfig {
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>, interval: Duration) -> Self {
        Self {
            store,
            location: location.into(),
            interval,
            checkpoint_on_close: false,
        }
    }

    pub fn checkpoint_on_close(mut self, enabled: bool) -> Self {
        self.checkpoint_on_close = enabled;
        self
    }
}

impl fmt::Debug for CheckpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointConfig")
            .field("store", &self.store)
            .field("location", &self.location)
            .field("interval", &self.interval)
            .field("checkpoint_on_close", &self.checkpoint_on_close)
            .finish()
    }
}

// == Checkpoint Report ==
/// Outcome of one record or restore cycle.
#[derive(Debug, Default)]
pub struct CheckpointReport {
    /// Shards written or restored successfully
    pub shards_ok: usize,
    /// Entries written or restored across successful shards
    pub keys: usize,
    /// Per-shard failures as `(shard index, error)`
    pub failures: Vec<(usize, CheckpointError)>,
}

impl CheckpointReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn collect(results: Vec<(usize, Result<usize, CheckpointError>)>) -> Self {
        let mut report = Self::default();
        for (index, result) in results {
            match result {
                Ok(keys) => {
                    report.shards_ok += 1;
                    report.keys += keys;
                }
                Err(e) => report.failures.push((index, e)),
            }
        }
        report
    }
}

/// Object name for the shard at `index`.
pub fn shard_object_name(index: usize) -> String {
    format!("shard-{}", index + 1)
}

// == Record ==
/// Writes every shard to `store` concurrently.
pub async fn record(table: &ShardTable, store: &dyn ObjectStore, location: &str) -> CheckpointReport {
    info!("Recording checkpoint to {}", location);

    let results = join_all(table.iter().enumerate().map(|(index, shard)| async move {
        let name = shard_object_name(index);
        let (bytes, keys) = shard.with_entries(|entries| {
            serialize_shard(entries).map(|bytes| (bytes, entries.len()))
        })?;
        store.put_object(location, &name, bytes).await?;
        Ok::<_, CheckpointError>(keys)
    }))
    .await;

    let report = CheckpointReport::collect((0..table.num_shards()).zip(results).collect());
    for (index, e) in &report.failures {
        warn!("Checkpoint of shard {} failed: {}", index, e);
    }
    info!(
        "Checkpoint recorded: {} shards, {} keys, {} failures",
        report.shards_ok,
        report.keys,
        report.failures.len()
    );
    report
}

// == Restore ==
/// Loads every shard from `store`, replacing its in-memory contents.
///
/// Entries already expired are dropped; the rest are registered with
/// `strategy`. A missing object leaves the shard empty. A shard whose object
/// cannot be read or decoded is reported and left untouched: empty when
/// restoring during `open`, holding its current entries when restoring a
/// live connection.
pub async fn restore(
    table: &ShardTable,
    strategy: &dyn EvictionStrategy,
    store: &dyn ObjectStore,
    location: &str,
) -> CheckpointReport {
    info!("Restoring checkpoint from {}", location);

    let results = join_all((0..table.num_shards()).map(|index| async move {
        let name = shard_object_name(index);
        let Some(bytes) = store.get_object(location, &name).await? else {
            debug!("No checkpoint object {} in {}", name, location);
            return Ok(0);
        };

        let mut entries = deserialize_shard(&bytes)?;
        let now = Expiry::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));

        let finite: Vec<_> = entries
            .iter()
            .filter(|(_, entry)| !entry.expires_at.is_never())
            .map(|(key, entry)| (key.clone(), entry.expires_at))
            .collect();
        let keys = entries.len();
        table.shard(index).replace(entries);

        for (key, expires_at) in finite {
            strategy.sync(table, &key, Some(expires_at));
        }
        Ok::<_, CheckpointError>(keys)
    }))
    .await;

    let report = CheckpointReport::collect((0..table.num_shards()).zip(results).collect());
    for (index, e) in &report.failures {
        warn!("Restore of shard {} failed, keeping its current entries: {}", index, e);
    }
    info!(
        "Checkpoint restored: {} shards, {} keys, {} failures",
        report.shards_ok,
        report.keys,
        report.failures.len()
    );
    report
}
