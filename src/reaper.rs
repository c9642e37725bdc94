//! Staleness reaper: periodic TTL eviction sweep.
//!
//! Replaces ad-hoc interval timers with a single cancellable task owned by
//! the session lifecycle. Because there is exactly one task, a sweep can
//! never overlap with itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::store::PresenceStore;

/// Periodically evicts records older than the TTL.
pub struct Reaper {
    store: Arc<PresenceStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    period: Duration,
}

impl Reaper {
    /// Create a reaper.
    ///
    /// The TTL should exceed the sweep period, otherwise records that simply
    /// have not been refreshed within one tick get evicted.
    #[must_use]
    pub fn new(store: Arc<PresenceStore>, clock: Arc<dyn Clock>, ttl_ms: u64, period: Duration) -> Self {
        Self {
            store,
            clock,
            ttl_ms,
            period,
        }
    }

    /// Run one sweep now.
    pub fn sweep(&self) {
        self.store.remove_stale(self.clock.now_ms(), self.ttl_ms);
    }

    /// Spawn the periodic sweep task.
    #[must_use]
    pub fn spawn(self) -> ReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    result = shutdown_rx.changed() => {
                        match result {
                            Ok(()) if *shutdown_rx.borrow() => break,
                            Ok(()) => {}
                            Err(_) => break,
                        }
                    }
                    _ = interval.tick() => {
                        debug!("Reaper sweep");
                        self.sweep();
                    }
                }
            }
            info!("Reaper stopped");
        });

        ReaperHandle { shutdown_tx, task }
    }
}

/// Handle to a spawned reaper task.
pub struct ReaperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Cancel the periodic timer and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{AgentId, AgentRecord, Position};

    fn record(id: &str) -> AgentRecord {
        AgentRecord::new(AgentId::from(id), Position::new(37.0, -122.0))
    }

    #[test]
    fn sweep_uses_clock_and_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(PresenceStore::new(clock.clone()));
        store.upsert("9q94r", record("d1"));

        let reaper = Reaper::new(
            store.clone(),
            clock.clone(),
            5000,
            Duration::from_secs(5),
        );

        clock.advance(4999);
        reaper.sweep();
        assert_eq!(store.len(), 1);

        clock.advance(1);
        reaper.sweep();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn periodic_task_sweeps_and_stops() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(PresenceStore::new(clock.clone()));
        store.upsert("9q94r", record("d1"));

        // Record is already past the TTL when the reaper starts ticking.
        clock.advance(6000);
        let handle = Reaper::new(store.clone(), clock.clone(), 5000, Duration::from_millis(10))
            .spawn();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !store.is_empty() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "reaper never swept the stale record"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.shutdown().await;
    }
}
