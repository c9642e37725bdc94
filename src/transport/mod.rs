//! Transport abstraction over the publish/subscribe broker connection.
//!
//! The ingest controller consumes [`TransportEvent`]s through this trait and
//! never touches the wire directly, so tests can script a fake transport and
//! the broker protocol stays swappable.

mod mqtt;

pub use mqtt::MqttTransport;

use async_trait::async_trait;

use crate::error::Result;

/// A lifecycle or message event surfaced by the transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The broker connection (or re-connection) completed. Subscriptions do
    /// not survive reconnects; the consumer must resubscribe on each of
    /// these.
    Connected,
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// The broker connection dropped. The transport keeps retrying on
    /// continued polling; retry and backoff are its concern alone.
    Disconnected { reason: String },
}

/// One broker connection, delivering text payloads on hierarchical topics.
#[async_trait]
pub trait Transport: Send {
    /// Prepare the connection. Actual network establishment may complete
    /// lazily inside `next_event`; a `Connected` event marks readiness.
    async fn connect(&mut self) -> Result<()>;

    /// Subscribe to a topic filter (e.g. `location/9q8yy/#`).
    async fn subscribe(&mut self, topic_filter: &str) -> Result<()>;

    /// Next event from the connection, in arrival order. `None` means the
    /// transport is permanently finished.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Unsubscribe and tear the connection down.
    async fn disconnect(&mut self) -> Result<()>;
}
