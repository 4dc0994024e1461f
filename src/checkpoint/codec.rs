//! Shard Codec
//!
//! Binary encoding of a shard's key/entry map for checkpoints. Value bytes
//! and expiry nanoseconds round-trip exactly.

use bytes::Bytes;

use crate::cache::ShardMap;
use crate::error::CheckpointError;

pub fn serialize_shard(entries: &ShardMap) -> Result<Bytes, CheckpointError> {
    bincode::serialize(entries)
        .map(Bytes::from)
        .map_err(CheckpointError::Encode)
}

pub fn deserialize_shard(bytes: &[u8]) -> Result<ShardMap, CheckpointError> {
    bincode::deserialize(bytes).map_err(CheckpointError::Decode)
}
