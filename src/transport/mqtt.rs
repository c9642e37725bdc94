//! MQTT transport backed by rumqttc.
//!
//! rumqttc's event loop re-establishes a dropped connection every time it is
//! polled again after an error, so reconnection lives entirely inside this
//! module. Repeated connection failures are collapsed into a single
//! `Disconnected` event followed by silent retries until the next `ConnAck`.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{Transport, TransportEvent};
use crate::error::{Error, Result};

/// Delay between reconnection attempts after a connection error.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Request channel capacity for the rumqttc client.
const REQUEST_CAPACITY: usize = 64;

pub struct MqttTransport {
    options: MqttOptions,
    conn: Option<(AsyncClient, EventLoop)>,
    subscribed: Vec<String>,
    /// Whether the last observed link state was up; used to emit exactly one
    /// `Disconnected` per outage.
    up: bool,
}

impl MqttTransport {
    /// Create a transport for the given broker host and port.
    #[must_use]
    pub fn new(client_id: &str, host: &str, port: u16, keep_alive: Duration) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(keep_alive);
        Self {
            options,
            conn: None,
            subscribed: Vec::new(),
            up: false,
        }
    }

    fn client(&self) -> Result<&AsyncClient> {
        self.conn
            .as_ref()
            .map(|(client, _)| client)
            .ok_or_else(|| Error::Connection("not connected".into()))
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&mut self) -> Result<()> {
        info!(
            host = %self.options.broker_address().0,
            port = self.options.broker_address().1,
            client_id = %self.options.client_id(),
            "Connecting to MQTT broker"
        );
        let (client, eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        self.conn = Some((client, eventloop));
        Ok(())
    }

    async fn subscribe(&mut self, topic_filter: &str) -> Result<()> {
        let client = self.client()?.clone();
        info!(topic = %topic_filter, "Subscribing");
        client.subscribe(topic_filter, QoS::AtMostOnce).await?;
        if !self.subscribed.iter().any(|t| t == topic_filter) {
            self.subscribed.push(topic_filter.to_string());
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        let (_, eventloop) = self.conn.as_mut()?;

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        self.up = true;
                        return Some(TransportEvent::Connected);
                    }
                    warn!(code = ?ack.code, "Broker refused connection");
                    self.up = false;
                    return Some(TransportEvent::Disconnected {
                        reason: format!("connection refused: {:?}", ack.code),
                    });
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(topic = %publish.topic, bytes = publish.payload.len(), "Message received");
                    return Some(TransportEvent::Message {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.up = false;
                    return Some(TransportEvent::Disconnected {
                        reason: "server disconnect".into(),
                    });
                }
                // Outgoing frames, pings, acks
                Ok(_) => continue,
                Err(e) => {
                    if self.up {
                        self.up = false;
                        return Some(TransportEvent::Disconnected {
                            reason: e.to_string(),
                        });
                    }
                    // Already reported the outage; keep retrying quietly.
                    debug!(error = %e, "Reconnect attempt failed");
                    sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some((client, _)) = self.conn.take() {
            for topic in self.subscribed.drain(..) {
                // Best effort: the connection may already be gone.
                let _ = client.unsubscribe(topic).await;
            }
            let _ = client.disconnect().await;
            info!("Disconnected from MQTT broker");
        }
        self.up = false;
        Ok(())
    }
}
