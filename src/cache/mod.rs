//! Cache Module
//!
//! Sharded in-memory storage with per-key TTL, and the `Cache` /
//! `Connection` facade that runs it.

mod connection;
mod entry;
mod router;
mod shard;
mod stats;


// Re-export public types
pub use connection::{Cache, Connection};
pub use entry::{current_timestamp_ns, Entry, Expiry};
pub use router::{shard_of, NUM_SHARDS, OVERFLOW_SHARD};
pub use shard::{Reclaim, Shard, ShardMap, ShardTable};
pub use stats::{Counters, Stats};

pub(crate) use connection::Shared;
