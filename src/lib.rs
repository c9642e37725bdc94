//! Fleetpulse - live driver presence cache over an MQTT location stream.
//!
//! Agents ("drivers") publish JSON position payloads on hierarchical
//! `location/<geohash>/<agent-id>` topics. This crate ingests that stream,
//! buckets the latest position per agent by geohash cell, evicts records
//! that go stale, and serves read-only snapshots to a presentation layer.
//!
//! # Architecture
//!
//! - [`geohash`] - pure coordinate-to-bucket-key encoding
//! - [`store`] - the bucketed, TTL-evicting presence cache
//! - [`transport`] - broker connection seam (`Transport` trait + MQTT impl)
//! - [`ingest`] - connection lifecycle, payload decoding, store upserts
//! - [`reaper`] - cancellable periodic staleness sweep
//! - [`snapshot`] - read-only view for renderers
//! - [`session`] - wires the above into one start/stop lifecycle
//! - [`config`] - TOML configuration with validation
//! - [`error`] - error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fleetpulse::clock::SystemClock;
//! use fleetpulse::config::Config;
//! use fleetpulse::session::Session;
//! use fleetpulse::transport::MqttTransport;
//!
//! # fn main() -> fleetpulse::error::Result<()> {
//! let config = Config::default();
//! let (host, port) = config.broker_addr()?;
//! let transport = MqttTransport::new(
//!     &config.broker.client_id,
//!     &host,
//!     port,
//!     Duration::from_secs(config.broker.keep_alive_secs),
//! );
//! let session = Session::start(&config, transport, Arc::new(SystemClock::new()));
//! let reader = session.snapshot_reader();
//! let _markers = reader.read();
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod geohash;
pub mod ingest;
pub mod reaper;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod transport;

pub mod cli;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
