use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::registry::ConnectionRegistry;

/// One timer for the whole registry: each tick writes a heartbeat to every
/// subscriber and prunes the ones whose write fails.
pub struct HeartbeatSweeper {
    registry: ConnectionRegistry,
    interval: Duration,
}

impl HeartbeatSweeper {
    pub fn new(registry: ConnectionRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Sweep until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "heartbeat sweeper started");

        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; new connections already got
        // their `connected` frame.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let pruned = self.registry.sweep_heartbeat();
                    debug!(pruned, live = self.registry.len(), "heartbeat sweep");
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("heartbeat sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::Role;

    #[tokio::test]
    async fn sweeper_sends_heartbeats_and_stops_on_shutdown() {
        let registry = ConnectionRegistry::new(16);
        let mut stream = registry.register("a", Role::Admin, None);
        let connected = stream.recv().await.expect("connected frame");
        assert!(connected.contains("event: connected"));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = HeartbeatSweeper::new(registry.clone(), Duration::from_millis(20));
        let handle = tokio::spawn(sweeper.run(shutdown_rx));

        let beat = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("heartbeat within timeout")
            .expect("stream open");
        assert!(beat.contains("event: heartbeat"));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper exits")
            .unwrap();
    }

    #[tokio::test]
    async fn sweeper_prunes_closed_connections() {
        let registry = ConnectionRegistry::new(16);
        let mut keep = registry.register("keep", Role::Admin, None);
        let _ = keep.try_recv();
        let mut gone = registry.register("gone", Role::Customer, None);
        // Closed but not dropped: the entry stays until the next write fails.
        gone.close();
        assert!(registry.contains("gone"));

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(HeartbeatSweeper::new(registry.clone(), Duration::from_millis(20)).run(shutdown_rx));

        let _ = tokio::time::timeout(Duration::from_secs(2), keep.recv()).await;
        assert!(!registry.contains("gone"));
        assert!(registry.contains("keep"));
    }
}
