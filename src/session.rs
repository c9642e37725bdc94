//! Session wiring: one store, one ingest task, one reaper.
//!
//! The session owns the store and both background tasks. Stopping it
//! disconnects the transport and cancels the reaper deterministically;
//! store contents are left in place so callers wanting a clean slate clear
//! the store explicitly.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::clock::Clock;
use crate::config::Config;
use crate::ingest::{IngestController, IngestHandle};
use crate::reaper::{Reaper, ReaperHandle};
use crate::snapshot::SnapshotReader;
use crate::store::PresenceStore;
use crate::transport::Transport;

/// A running ingest session over one transport connection.
pub struct Session {
    store: Arc<PresenceStore>,
    ingest: IngestHandle,
    reaper: ReaperHandle,
}

impl Session {
    /// Start ingesting over the given transport.
    ///
    /// The store, ingest controller and reaper are wired from `config`; the
    /// clock is injectable so tests can drive staleness virtually.
    #[must_use]
    pub fn start<T: Transport + 'static>(
        config: &Config,
        transport: T,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(
            PresenceStore::new(clock.clone()).with_policy(config.presence.on_move),
        );

        let ingest = IngestController::new(
            transport,
            store.clone(),
            config.broker.topic_filter.clone(),
            config.presence.precision,
        )
        .spawn();

        let reaper = Reaper::new(
            store.clone(),
            clock,
            config.presence.ttl_ms,
            Duration::from_millis(config.presence.sweep_ms),
        )
        .spawn();

        info!(
            topic = %config.broker.topic_filter,
            precision = config.presence.precision,
            ttl_ms = config.presence.ttl_ms,
            sweep_ms = config.presence.sweep_ms,
            "Session started"
        );

        Self {
            store,
            ingest,
            reaper,
        }
    }

    /// Shared handle to the underlying store.
    #[must_use]
    pub fn store(&self) -> Arc<PresenceStore> {
        self.store.clone()
    }

    /// Read-only view for the presentation layer.
    #[must_use]
    pub fn snapshot_reader(&self) -> SnapshotReader {
        SnapshotReader::new(self.store.clone())
    }

    /// Stop ingest and reaper, leaving store contents intact.
    pub async fn stop(self) {
        self.ingest.shutdown().await;
        self.reaper.shutdown().await;
        info!("Session stopped");
    }
}
