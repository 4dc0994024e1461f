//! Shard Table Module
//!
//! Fixed-size array of independently locked maps. Every operation takes
//! only the lock of the shard it touches, so work on one shard never
//! blocks another.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::entry::{Entry, Expiry};
use crate::cache::router::{shard_of, NUM_SHARDS};

/// Contents of one shard.
pub type ShardMap = HashMap<Vec<u8>, Entry>;

// == Reclaim Outcome ==
/// Result of a conditional delete of an expired key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaim {
    /// The entry was expired and has been removed
    Removed,
    /// No entry for the key (already evicted or deleted)
    Absent,
    /// The entry is still live with this expiry
    Live(Expiry),
}

// == Shard ==
/// One partition of the key space guarded by its own reader/writer lock.
#[derive(Debug, Default)]
pub struct Shard {
    entries: RwLock<ShardMap>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones out the entry for `key`, expired or not.
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `entry`, replacing any previous entry wholesale.
    pub fn set(&self, key: Vec<u8>, entry: Entry) -> Option<Entry> {
        self.entries.write().insert(key, entry)
    }

    pub fn delete(&self, key: &[u8]) -> Option<Entry> {
        self.entries.write().remove(key)
    }

    /// Current expiry of `key`, or `None` if it is absent.
    pub fn expiry_of(&self, key: &[u8]) -> Option<Expiry> {
        self.entries.read().get(key).map(|entry| entry.expires_at)
    }

    // == Remove If Expired ==
    /// Deletes `key` only if its current entry is expired at `now`.
    ///
    /// The check and the delete happen under one write lock, so an entry
    /// rewritten since the caller decided it was expired survives.
    pub fn remove_if_expired(&self, key: &[u8], now: Expiry) -> Reclaim {
        let mut entries = self.entries.write();
        match entries.get(key) {
            None => Reclaim::Absent,
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(key);
                Reclaim::Removed
            }
            Some(entry) => Reclaim::Live(entry.expires_at),
        }
    }

    /// Keys whose entries are expired at `now`, collected under a read lock.
    pub fn expired_keys(&self, now: Expiry) -> Vec<Vec<u8>> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Runs `f` against a consistent view of the shard under its read lock.
    pub fn with_entries<R>(&self, f: impl FnOnce(&ShardMap) -> R) -> R {
        let entries = self.entries.read();
        f(&entries)
    }

    /// Replaces the whole shard, returning the previous contents.
    pub fn replace(&self, entries: ShardMap) -> ShardMap {
        std::mem::replace(&mut *self.entries.write(), entries)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

// == Shard Table ==
/// The full set of shards, indexed `0..NUM_SHARDS`.
#[derive(Debug)]
pub struct ShardTable {
    shards: Box<[Shard]>,
}

impl ShardTable {
    /// Allocates a table with every shard empty.
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Shard::new()).collect(),
        }
    }

    /// The shard at `index`.
    ///
    /// # Panics
    /// If `index >= NUM_SHARDS`. Indices from `shard_of` are always valid.
    pub fn shard(&self, index: usize) -> &Shard {
        &self.shards[index]
    }

    /// The shard that owns `key`.
    pub fn shard_for(&self, key: &[u8]) -> &Shard {
        self.shard(shard_of(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shard> {
        self.shards.iter()
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    // == Size ==
    /// Total entry count summed shard by shard.
    ///
    /// Each shard is read under its own lock independently, so the sum is
    /// a snapshot approximation: concurrent writers may make it differ
    /// from the true population at any single instant. Expired entries
    /// not yet reclaimed are included.
    pub fn size(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn clear(&self) {
        self.shards.iter().for_each(Shard::clear);
    }
}

impl Default for ShardTable {
    fn default() -> Self {
        Self::new()
    }
}
