//! Shard Cache daemon
//!
//! Hosts a single cache connection configured from the environment,
//! logging statistics until it is asked to shut down.

use std::time::Duration;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shard_cache::Config;

/// Interval between statistics log lines.
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Main entry point for the Shard Cache daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the connection (restoring the checkpoint if configured)
/// 4. Log statistics periodically
/// 5. Close the connection on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shard_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shard Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}ms, gc_interval={}ms, eviction={:?}, checkpoint_dir={:?}",
        config.default_ttl_ms, config.gc_interval_ms, config.eviction, config.checkpoint_dir
    );

    let conn = config.to_cache("shard_cache").open("shard_cache").await?;

    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let stats = conn.stats()?;
                info!(
                    "Stats: keys={}, tracked={}, hit_rate={:.2}, reclaimed={}",
                    stats.key_count,
                    stats.tracked_keys,
                    stats.hit_rate(),
                    stats.reclaimed
                );
            }
        }
    }

    conn.close().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
