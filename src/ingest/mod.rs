//! Ingest controller: drives the transport lifecycle and feeds the store.
//!
//! One controller owns exactly one transport connection. Inbound messages
//! are decoded and upserted in arrival order by a single task, so the store
//! lock is never held across a network wait.

pub mod wire;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geohash;
use crate::store::PresenceStore;
use crate::transport::{Transport, TransportEvent};

/// Transport lifecycle state, for logging and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Decodes inbound messages and drives presence-store upserts.
pub struct IngestController<T: Transport> {
    transport: T,
    store: Arc<PresenceStore>,
    topic_filter: String,
    precision: usize,
    state: ConnectionState,
}

impl<T: Transport + 'static> IngestController<T> {
    #[must_use]
    pub fn new(
        transport: T,
        store: Arc<PresenceStore>,
        topic_filter: String,
        precision: usize,
    ) -> Self {
        Self {
            transport,
            store,
            topic_filter,
            precision,
            state: ConnectionState::Disconnected,
        }
    }

    /// Spawn the controller as a tokio task with a shutdown channel.
    #[must_use]
    pub fn spawn(self) -> IngestHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            if let Err(e) = self.run(shutdown_rx).await {
                warn!(error = %e, "Ingest controller exited with error");
            }
        });
        IngestHandle { shutdown_tx, task }
    }

    /// Run the event loop until shutdown or end of stream.
    ///
    /// On shutdown the transport is unsubscribed and disconnected and the
    /// liveness flag cleared; store contents are left as-is.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.state = ConnectionState::Connecting;
        self.transport.connect().await?;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) if *shutdown.borrow() => {
                            info!("Ingest shutdown requested");
                            break;
                        }
                        Ok(()) => {}
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                event = self.transport.next_event() => {
                    let Some(event) = event else {
                        info!("Transport stream ended");
                        break;
                    };
                    self.handle_event(event).await;
                }
            }
        }

        self.transport.disconnect().await?;
        self.store.mark_connected(false);
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                // Subscriptions do not survive reconnects; renew on every
                // Connected transition.
                if let Err(e) = self.transport.subscribe(&self.topic_filter).await {
                    warn!(error = %e, topic = %self.topic_filter, "Subscribe failed");
                    return;
                }
                self.store.mark_connected(true);
                self.state = ConnectionState::Connected;
                info!(topic = %self.topic_filter, "Ingest connected");
            }
            TransportEvent::Message { topic, payload } => {
                self.handle_message(&topic, &payload);
            }
            TransportEvent::Disconnected { reason } => {
                // Existing records persist until the reaper evicts them,
                // giving renderers a grace period instead of a blank map.
                warn!(reason = %reason, "Connection lost");
                self.store.mark_connected(false);
                self.state = ConnectionState::Connecting;
            }
        }
    }

    /// Decode one payload and upsert it. Malformed payloads are dropped with
    /// a single warning and never reach the store.
    fn handle_message(&self, topic: &str, payload: &[u8]) {
        match wire::decode(payload) {
            Ok(record) => {
                // The bucket key is derived from the decoded position, never
                // from the topic's geohash segment; the two can diverge when
                // a publisher's topic assignment lags its reported position.
                let key = geohash::encode(
                    record.position.latitude,
                    record.position.longitude,
                    self.precision,
                );
                debug!(agent = %record.agent_id, bucket = %key, "Upserting position");
                self.store.upsert(&key, record);
            }
            Err(e) => {
                warn!(error = %e, topic = %topic, "Dropping malformed payload");
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

/// Handle to a spawned ingest task.
pub struct IngestHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl IngestHandle {
    /// Signal shutdown and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
