//! Shard Cache - An embeddable in-memory key/value cache
//!
//! Keys are spread over independently locked shards and carry a per-key
//! TTL. Expired keys are hidden from reads immediately and reclaimed in the
//! background, either from a priority queue of expiry instants or by a
//! periodic sweep. Shards can optionally be checkpointed to an object store.
//!
//! ```no_run
//! use std::time::Duration;
//! use shard_cache::Cache;
//!
//! # async fn demo() -> shard_cache::error::Result<()> {
//! let conn = Cache::new(Duration::from_secs(60), Duration::from_secs(1))
//!     .open("sessions")
//!     .await?;
//!
//! conn.write("abc", vec![1u8, 2, 3])?;
//! assert_eq!(conn.read("abc")?, vec![1u8, 2, 3]);
//!
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod eviction;
mod tasks;

pub use cache::{Cache, Connection, Stats};
pub use checkpoint::{CheckpointConfig, CheckpointReport, FsObjectStore, MemoryObjectStore, ObjectStore};
pub use config::Config;
pub use error::{CacheError, CheckpointError, Result};
pub use eviction::{EvictionMode, EvictionStrategy};
