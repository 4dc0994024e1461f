//! Priority-Queue Eviction
//!
//! GC bookkeeping for keys with a finite TTL: an indexed min-heap ordered
//! by expiry plus a key lookup holding each key's heap handle.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::{Expiry, Reclaim, ShardTable};
use crate::eviction::heap::{Handle, IndexedHeap};
use crate::eviction::EvictionStrategy;

// == GC Index ==
/// Heap and lookup are always mutated together under one lock.
///
/// Invariant: `lookup` holds exactly the keys present in `heap`, one
/// handle per key.
#[derive(Debug, Default)]
struct GcIndex {
    heap: IndexedHeap<Vec<u8>, Expiry>,
    lookup: HashMap<Vec<u8>, Handle>,
}

impl GcIndex {
    /// Inserts `key` or moves its existing entry to `expires_at`.
    fn track(&mut self, key: &[u8], expires_at: Expiry) {
        match self.lookup.get(key) {
            Some(&handle) => {
                self.heap.update(handle, expires_at);
            }
            None => {
                let handle = self.heap.push(key.to_vec(), expires_at);
                self.lookup.insert(key.to_vec(), handle);
            }
        }
    }

    fn untrack(&mut self, key: &[u8]) {
        if let Some(handle) = self.lookup.remove(key) {
            self.heap.remove(handle);
        }
    }

    /// Pops every key whose expiry has been reached at `now`.
    ///
    /// Stops at the first key still in the future.
    fn pop_expired(&mut self, now: Expiry) -> Vec<Vec<u8>> {
        let mut expired = Vec::new();
        while let Some(expires_at) = self.heap.peek().map(|(_, expires_at)| expires_at) {
            if !expires_at.is_expired_at(now) {
                break;
            }
            if let Some((key, _)) = self.heap.pop() {
                self.lookup.remove(&key);
                expired.push(key);
            }
        }
        expired
    }
}

// == Priority Queue Eviction ==
#[derive(Debug, Default)]
pub struct PriorityQueueEviction {
    index: Mutex<GcIndex>,
}

impl PriorityQueueEviction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiry currently recorded for `key`, if it is tracked.
    #[cfg(test)]
    fn tracked_expiry(&self, key: &[u8]) -> Option<Expiry> {
        let index = self.index.lock();
        let handle = *index.lookup.get(key)?;
        index.heap.get(handle).map(|(_, expires_at)| expires_at)
    }
}

impl EvictionStrategy for PriorityQueueEviction {
    fn name(&self) -> &'static str {
        "priority-queue"
    }

    fn on_write(&self, key: &[u8], expires_at: Expiry) {
        let mut index = self.index.lock();
        if expires_at.is_never() {
            index.untrack(key);
        } else {
            index.track(key, expires_at);
        }
    }

    fn on_delete(&self, key: &[u8]) {
        self.index.lock().untrack(key);
    }

    fn tick(&self, table: &ShardTable, now: Expiry) -> usize {
        let expired = self.index.lock().pop_expired(now);
        if expired.is_empty() {
            return 0;
        }

        let mut removed = 0;
        let mut rewritten = Vec::new();
        for key in expired {
            match table.shard_for(&key).remove_if_expired(&key, now) {
                Reclaim::Removed => removed += 1,
                Reclaim::Absent => {}
                // Rewritten after it was popped; follow the live expiry.
                Reclaim::Live(expires_at) if !expires_at.is_never() => {
                    rewritten.push((key, expires_at));
                }
                Reclaim::Live(_) => {}
            }
        }

        if !rewritten.is_empty() {
            let mut index = self.index.lock();
            for (key, expires_at) in rewritten {
                if !index.lookup.contains_key(&key) {
                    index.track(&key, expires_at);
                }
            }
        }

        removed
    }

    fn tracked(&self) -> usize {
        self.index.lock().lookup.len()
    }

    fn on_close(&self) {
        let mut index = self.index.lock();
        index.heap.clear();
        index.lookup.clear();
    }
}
