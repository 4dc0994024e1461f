//! Reclaim Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::Shared;

/// Spawns a background task that runs the connection's eviction strategy
/// every `interval` until `shutdown` is cancelled.
///
/// Cancellation is observed at tick boundaries; a tick in progress runs to
/// completion first.
///
/// # Returns
/// A JoinHandle that completes once the loop has exited.
pub(crate) fn spawn_reclaim_task(
    shared: Arc<Shared>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting {} reclaim task with interval of {:?}",
            shared.strategy.name(),
            interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let removed = shared.reclaim_expired();
            if removed > 0 {
                info!("TTL reclaim: removed {} expired entries", removed);
            } else {
                debug!("TTL reclaim: no expired entries found");
            }
        }

        debug!("Reclaim task stopped");
    })
}
