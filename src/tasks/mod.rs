//! Background Tasks Module
//!
//! Long-lived tasks owned by a `Connection`. Each one stops when its
//! cancellation token fires and is awaited by `Connection::close`.
//!
//! # Tasks
//! - Reclaim: runs the eviction strategy at the GC interval
//! - Checkpoint: records shard snapshots at the checkpoint interval

mod checkpoint;
mod reclaim;

pub(crate) use checkpoint::spawn_checkpoint_task;
pub(crate) use reclaim::spawn_reclaim_task;
