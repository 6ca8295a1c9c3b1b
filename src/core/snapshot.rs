//! Periodic flush of the storage backend to its durable medium

use crate::storage::MetricStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Background loop calling `flush` on a fixed interval
pub struct SnapshotScheduler {
    storage: Arc<dyn MetricStorage>,
    interval: Duration,
}

impl SnapshotScheduler {
    pub fn new(storage: Arc<dyn MetricStorage>, interval: Duration) -> Self {
        Self { storage, interval }
    }

    /// Start the loop; it ends when `shutdown` flips to `true` or its sender is dropped
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Snapshot scheduler started ({} backend, every {:?})",
            self.storage.kind(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.storage.flush().await {
                        Ok(()) => debug!("Snapshot flushed"),
                        Err(e) => warn!("Snapshot flush failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Snapshot scheduler stopped");
    }
}
