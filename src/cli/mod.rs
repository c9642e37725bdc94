//! Command-line interface definitions.

pub mod check;
pub mod encode;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fleetpulse - live driver presence cache over an MQTT location stream.
#[derive(Parser, Debug)]
#[command(name = "fleetpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the presence cache (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Encode a coordinate pair as a geohash bucket key
    Encode(EncodeArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Override the subscription topic filter
    #[arg(long)]
    pub topic: Option<String>,

    /// Seconds between status log lines (0 disables)
    #[arg(long, default_value_t = 30)]
    pub status_interval_secs: u64,
}

/// Subcommands for `fleetpulse check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config,
}

#[derive(Parser, Debug)]
#[command(allow_negative_numbers = true)]
pub struct EncodeArgs {
    /// Latitude in degrees, -90 to 90
    pub latitude: f64,

    /// Longitude in degrees, -180 to 180
    pub longitude: f64,

    /// Geohash precision in characters
    #[arg(short, long, default_value_t = 5)]
    pub precision: usize,
}
