//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache connections.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is absent or its TTL has elapsed
    #[error("Key not found")]
    NotFound,

    /// The connection has been closed and no longer serves requests
    #[error("Connection closed")]
    Closed,

    /// Configuration cannot produce a working connection
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A checkpoint operation failed
    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl CacheError {
    /// Returns true for a plain cache miss.
    ///
    /// Misses are a normal outcome of `read`, not a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound)
    }
}

// == Checkpoint Error Enum ==
/// Failures confined to the checkpoint collaborator.
///
/// None of these touch in-memory state; they are reported per shard.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Encoding a shard to bytes failed
    #[error("Failed to encode shard: {0}")]
    Encode(#[source] bincode::Error),

    /// Decoding a shard from bytes failed
    #[error("Failed to decode shard: {0}")]
    Decode(#[source] bincode::Error),

    /// The object store could not read or write an object
    #[error("Storage error on {name}: {source}")]
    Storage {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
