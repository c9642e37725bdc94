//! Handler for the `run` command.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use crate::transport::MqttTransport;

/// Execute the run command.
pub async fn execute(cli: &Cli, args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(ref topic) = args.topic {
        config.broker.topic_filter = topic.clone();
    }
    config.validate()?;

    config.init_logging();
    info!("fleetpulse starting");

    let (host, port) = config.broker_addr()?;
    let transport = MqttTransport::new(
        &config.broker.client_id,
        &host,
        port,
        Duration::from_secs(config.broker.keep_alive_secs),
    );

    let session = Session::start(&config, transport, Arc::new(SystemClock::new()));
    let store = session.store();

    // 0 disables status lines; a year-long period keeps the select! arm simple.
    let status_period = if args.status_interval_secs == 0 {
        Duration::from_secs(60 * 60 * 24 * 365)
    } else {
        Duration::from_secs(args.status_interval_secs)
    };
    let mut status_interval = tokio::time::interval(status_period);
    status_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    status_interval.tick().await;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = status_interval.tick() => {
                info!(
                    agents = store.len(),
                    buckets = store.bucket_count(),
                    connected = store.is_connected(),
                    "Presence status"
                );
            }
        }
    }

    session.stop().await;
    info!("fleetpulse stopped");
    Ok(())
}
