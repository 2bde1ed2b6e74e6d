//! Background cache sweeper
//!
//! A periodic task that purges expired entries from the in-memory stores,
//! plus a one-time startup sweep of the durable tier. The read and write
//! paths use lazy expiry; the sweeper only bounds how long stale entries
//! linger. Started explicitly and stopped via its handle, so the task's
//! lifetime is tied to the application rather than to module load.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::CacheService;

/// Configuration for the sweep loop.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often expired entries are purged.
    pub interval: Duration,
    /// Whether the periodic sweep runs at all. The startup durable sweep
    /// happens regardless.
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Handle for controlling the background sweeper task.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Sweeps the durable tier once, then spawns the periodic in-memory
    /// sweep task.
    pub fn spawn<V>(config: SweeperConfig, service: CacheService<V>) -> Self
    where
        V: Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        service.sweep_durable();

        if config.enabled {
            let interval = config.interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // Skip the first tick (immediate)
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            service.cleanup();
                            debug!("sweeper: purged expired cache entries");
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self { shutdown_tx }
    }

    /// Stops the background sweep task.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
