//! Checkpoint Task
//!
//! Background task that records a checkpoint on a fixed interval.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::Shared;
use crate::checkpoint::{self, CheckpointConfig};

/// Spawns a task recording a checkpoint every `config.interval`.
///
/// The first checkpoint is taken one interval after start, since the
/// connection has just been restored. Failed shards are logged by
/// `checkpoint::record` and retried on the next tick.
pub(crate) fn spawn_checkpoint_task(
    shared: Arc<Shared>,
    config: CheckpointConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting checkpoint task for {} with interval of {:?}",
            config.location, config.interval
        );

        let mut ticker =
            tokio::time::interval_at(Instant::now() + config.interval, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            checkpoint::record(&shared.table, config.store.as_ref(), &config.location).await;
        }

        debug!("Checkpoint task stopped");
    })
}
