//! Sweep Eviction
//!
//! Scans every shard on each tick. Work per tick is proportional to the
//! total key count, so this suits low-churn caches where GC bookkeeping
//! is not worth its memory.

use crate::cache::{Expiry, Reclaim, ShardTable};
use crate::eviction::EvictionStrategy;

#[derive(Debug, Default)]
pub struct SweepEviction;

impl SweepEviction {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionStrategy for SweepEviction {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn on_write(&self, _key: &[u8], _expires_at: Expiry) {}

    fn on_delete(&self, _key: &[u8]) {}

    fn sync(&self, _table: &ShardTable, _key: &[u8], _expires_at: Option<Expiry>) {}

    // Two phases per shard: collect under the read lock, then delete
    // each key under a short write lock.
    fn tick(&self, table: &ShardTable, now: Expiry) -> usize {
        table
            .iter()
            .map(|shard| {
                shard
                    .expired_keys(now)
                    .iter()
                    .filter(|key| shard.remove_if_expired(key, now) == Reclaim::Removed)
                    .count()
            })
            .sum()
    }

    fn tracked(&self) -> usize {
        0
    }

    fn on_close(&self) {}
}
