//! Domain types for the presence cache.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new `AgentId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the agent ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A reported geographic position.
///
/// The store does not validate ranges; values are surfaced to callers as-is.
/// The ingest path rejects non-finite and out-of-range coordinates before
/// they reach the store (geohash encoding requires valid input).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and within valid geographic ranges.
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The latest known state of one reporting agent.
///
/// At most one record per agent exists in any bucket. `attributes` carries
/// whatever extra fields arrived in the message payload, passed through
/// unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub position: Position,
    /// Opaque passthrough of additional payload fields.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Monotonic milliseconds, stamped by the store on every upsert.
    pub last_update_ms: u64,
}

impl AgentRecord {
    #[must_use]
    pub fn new(agent_id: AgentId, position: Position) -> Self {
        Self {
            agent_id,
            position,
            attributes: serde_json::Map::new(),
            last_update_ms: 0,
        }
    }

    #[must_use]
    pub fn with_attributes(
        mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.attributes = attributes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_round_trips() {
        let id = AgentId::from("driver-42");
        assert_eq!(id.as_str(), "driver-42");
        assert_eq!(id.to_string(), "driver-42");
        assert_eq!(id, AgentId::new(String::from("driver-42")));
    }

    #[test]
    fn position_range_check() {
        assert!(Position::new(37.0, -122.0).in_range());
        assert!(Position::new(-90.0, 180.0).in_range());
        assert!(!Position::new(91.0, 0.0).in_range());
        assert!(!Position::new(0.0, -180.5).in_range());
        assert!(!Position::new(f64::NAN, 0.0).in_range());
        assert!(!Position::new(0.0, f64::INFINITY).in_range());
    }

    #[test]
    fn record_carries_attributes() {
        let mut attrs = serde_json::Map::new();
        attrs.insert("route".into(), serde_json::json!([]));
        let record = AgentRecord::new(AgentId::from("d1"), Position::new(1.0, 2.0))
            .with_attributes(attrs.clone());
        assert_eq!(record.attributes, attrs);
        assert_eq!(record.last_update_ms, 0);
    }
}
