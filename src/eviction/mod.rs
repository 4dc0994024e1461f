//! Eviction Module
//!
//! Active reclaim strategies for expired entries. Both strategies run
//! alongside the lazy eviction performed by `Connection::read`, which is
//! what guarantees an expired value is never returned.
//!
//! # Strategies
//! - `PriorityQueueEviction`: min-heap of finite-TTL keys ordered by
//!   expiry; each tick pops only what has expired.
//! - `SweepEviction`: scans every shard on each tick.
//!
//! # Lock order
//! A shard lock and the GC index lock are never held at the same time.
//! Writers release the shard lock before touching the index; the reclaim
//! loop releases the index lock before deleting from shards. Because of
//! that, writers settle their bookkeeping with `EvictionStrategy::sync`,
//! which re-reads the shard until index and entry agree.

mod gc_index;
mod heap;
mod sweep;

use std::fmt;
use std::str::FromStr;

use crate::cache::{Expiry, ShardTable};

pub use gc_index::PriorityQueueEviction;
pub use heap::{Handle, IndexedHeap};
pub use sweep::SweepEviction;

// == Eviction Strategy ==
/// A pluggable active-reclaim policy, selected when a connection opens.
pub trait EvictionStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Called after `key` has been stored with `expires_at`.
    fn on_write(&self, key: &[u8], expires_at: Expiry);

    /// Called after `key` has been explicitly deleted.
    fn on_delete(&self, key: &[u8]);

    /// Removes entries expired at `now` and returns how many were removed.
    fn tick(&self, table: &ShardTable, now: Expiry) -> usize;

    /// Number of keys currently held in reclaim bookkeeping.
    fn tracked(&self) -> usize;

    /// Releases bookkeeping once the connection is closed.
    fn on_close(&self);

    /// Applies `expires_at` for `key` (`None` after a delete), then re-reads
    /// the shard entry and repeats until the two agree.
    ///
    /// Concurrent writers to one key may reach the strategy in a different
    /// order than they reached the shard. The writer whose update lands last
    /// re-reads the final entry afterwards, so bookkeeping always ends on the
    /// entry the shard actually holds. No shard lock is held while the
    /// strategy is called.
    fn sync(&self, table: &ShardTable, key: &[u8], mut expires_at: Option<Expiry>) {
        let shard = table.shard_for(key);
        loop {
            match expires_at {
                Some(expires_at) => self.on_write(key, expires_at),
                None => self.on_delete(key),
            }
            let current = shard.expiry_of(key);
            if current == expires_at {
                return;
            }
            expires_at = current;
        }
    }
}

// == Eviction Mode ==
/// Which strategy a connection runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionMode {
    /// Priority-queue driven GC (reclaim work proportional to expired keys)
    #[default]
    PriorityQueue,
    /// Full-table sweep every tick
    Sweep,
}

impl EvictionMode {
    pub fn build(self) -> Box<dyn EvictionStrategy> {
        match self {
            EvictionMode::PriorityQueue => Box::new(PriorityQueueEviction::new()),
            EvictionMode::Sweep => Box::new(SweepEviction::new()),
        }
    }
}

impl FromStr for EvictionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" | "pq" | "priority-queue" => Ok(EvictionMode::PriorityQueue),
            "sweep" => Ok(EvictionMode::Sweep),
            other => Err(format!("unknown eviction strategy: {other}")),
        }
    }
}
