//! Test doubles for integration tests (feature `testkit`).

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::transport::{Transport, TransportEvent};

pub use crate::clock::ManualClock;

/// Transport double that replays scripted events and records subscriptions.
///
/// Events are delivered in order; once the script (and the optional live
/// channel) is exhausted, `next_event` returns `None` and a consuming
/// controller winds down.
pub struct FakeTransport {
    events: VecDeque<TransportEvent>,
    live: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    disconnect_calls: Arc<Mutex<usize>>,
}

impl FakeTransport {
    /// Replay a fixed list of events, then end the stream.
    #[must_use]
    pub fn scripted(events: Vec<TransportEvent>) -> Self {
        Self {
            events: events.into(),
            live: None,
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            disconnect_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a transport fed at runtime through the returned sender.
    ///
    /// The stream ends when the sender is dropped.
    #[must_use]
    pub fn channelled() -> (Self, mpsc::UnboundedSender<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut transport = Self::scripted(Vec::new());
        transport.live = Some(rx);
        (transport, tx)
    }

    /// Shared view of every topic filter subscribed so far.
    #[must_use]
    pub fn subscriptions(&self) -> Arc<Mutex<Vec<String>>> {
        self.subscriptions.clone()
    }

    /// Shared counter of `disconnect` calls.
    #[must_use]
    pub fn disconnect_calls(&self) -> Arc<Mutex<usize>> {
        self.disconnect_calls.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&mut self, topic_filter: &str) -> Result<()> {
        self.subscriptions.lock().push(topic_filter.to_string());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        match self.live.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        *self.disconnect_calls.lock() += 1;
        Ok(())
    }
}
