//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file; every knob has a default so an
//! empty file is a valid config pointing at a local broker.

use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;
use uuid::Uuid;

use crate::error::{ConfigError, Result};
use crate::store::MovePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker URI, e.g. `mqtt://localhost:1883`.
    #[serde(default = "default_broker_uri")]
    pub uri: String,
    /// Client identifier presented to the broker. Generated when absent.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Topic filter to subscribe to. Narrow it to a geohash prefix
    /// (`location/9q8yy/#`) to scope ingest to an area of interest.
    #[serde(default = "default_topic_filter")]
    pub topic_filter: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

/// Presence cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Geohash bucket precision in characters (1-12).
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Record time-to-live in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Reaper sweep period in milliseconds. Keep it at or below the TTL.
    #[serde(default = "default_sweep_ms")]
    pub sweep_ms: u64,
    /// What happens to an agent's old-bucket record when it moves cells.
    #[serde(default)]
    pub on_move: MovePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_broker_uri() -> String {
    "mqtt://localhost:1883".into()
}

fn default_client_id() -> String {
    format!("fleetpulse-{}", Uuid::new_v4().simple())
}

fn default_topic_filter() -> String {
    "location/#".into()
}

const fn default_keep_alive_secs() -> u64 {
    30
}

const fn default_precision() -> usize {
    5
}

const fn default_ttl_ms() -> u64 {
    5000
}

const fn default_sweep_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            uri: default_broker_uri(),
            client_id: default_client_id(),
            topic_filter: default_topic_filter(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            ttl_ms: default_ttl_ms(),
            sweep_ms: default_sweep_ms(),
            on_move: MovePolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            presence: PresenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.broker.uri.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "broker.uri" }.into());
        }
        self.broker_addr()?;

        if self.broker.topic_filter.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "broker.topic_filter",
            }
            .into());
        }

        if !(1..=12).contains(&self.presence.precision) {
            return Err(ConfigError::InvalidValue {
                field: "presence.precision",
                reason: format!("{} is not in 1..=12", self.presence.precision),
            }
            .into());
        }

        // rumqttc rejects keep-alive intervals under 5 seconds
        if self.broker.keep_alive_secs < 5 {
            return Err(ConfigError::InvalidValue {
                field: "broker.keep_alive_secs",
                reason: "must be at least 5".into(),
            }
            .into());
        }

        if self.presence.ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "presence.ttl_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }

        if self.presence.sweep_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "presence.sweep_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }

        Ok(())
    }

    /// Host and port parsed from the broker URI.
    pub fn broker_addr(&self) -> Result<(String, u16)> {
        let url = Url::parse(&self.broker.uri)?;
        match url.scheme() {
            "mqtt" | "tcp" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "broker.uri",
                    reason: format!("unsupported scheme '{other}', expected mqtt:// or tcp://"),
                }
                .into());
            }
        }
        let host = url
            .host_str()
            .ok_or(ConfigError::MissingField {
                field: "broker.uri host",
            })?
            .to_string();
        let port = url.port().unwrap_or(1883);
        Ok((host, port))
    }

    /// Initialize the tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.broker.uri, "mqtt://localhost:1883");
        assert_eq!(config.broker.topic_filter, "location/#");
        assert_eq!(config.presence.precision, 5);
        assert_eq!(config.presence.ttl_ms, 5000);
        assert_eq!(config.presence.sweep_ms, 5000);
        assert_eq!(config.presence.on_move, MovePolicy::Linger);
        assert!(config.broker.client_id.starts_with("fleetpulse-"));
        config.validate().unwrap();
    }

    #[test]
    fn broker_addr_parses_host_and_port() {
        let config: Config = toml::from_str(
            r#"
            [broker]
            uri = "mqtt://broker.example.com:8883"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.broker_addr().unwrap(),
            ("broker.example.com".to_string(), 8883)
        );
    }

    #[test]
    fn broker_addr_defaults_port() {
        let config: Config = toml::from_str(
            r#"
            [broker]
            uri = "tcp://10.0.2.2"
            "#,
        )
        .unwrap();
        assert_eq!(config.broker_addr().unwrap().1, 1883);
    }

    #[test]
    fn rejects_bad_scheme() {
        let config: Config = toml::from_str(
            r#"
            [broker]
            uri = "http://localhost"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_precision() {
        let config: Config = toml::from_str(
            r#"
            [presence]
            precision = 13
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_move_policy() {
        let config: Config = toml::from_str(
            r#"
            [presence]
            on_move = "migrate"
            "#,
        )
        .unwrap();
        assert_eq!(config.presence.on_move, MovePolicy::Migrate);
    }
}
