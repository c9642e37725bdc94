//! Handlers for `fleetpulse check` diagnostics.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Validate the configuration file and report the effective settings.
pub fn config(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let (host, port) = config.broker_addr()?;

    println!("config ok: {}", cli.config.display());
    println!("  broker:     {host}:{port}");
    println!("  topic:      {}", config.broker.topic_filter);
    println!("  precision:  {}", config.presence.precision);
    println!("  ttl_ms:     {}", config.presence.ttl_ms);
    println!("  sweep_ms:   {}", config.presence.sweep_ms);
    println!("  on_move:    {:?}", config.presence.on_move);
    Ok(())
}
