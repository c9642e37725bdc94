//! Wire format for inbound location messages.
//!
//! Payloads are UTF-8 JSON objects shaped like the fleet publisher emits:
//!
//! ```json
//! {
//!   "driverId": "64575d696ca2794dc626d5b8",
//!   "driverLocation": { "latitude": 6.178, "longitude": -75.579 },
//!   "route": [],
//!   "colorVehicle": true
//! }
//! ```
//!
//! `driverId` and `driverLocation` are required; everything else is carried
//! through opaquely as record attributes.

use serde::Deserialize;

use crate::domain::{AgentId, AgentRecord, Position};
use crate::error::DecodeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub driver_id: String,
    pub driver_location: WireLocation,
    /// All fields not named above, passed through unmodified.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct WireLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Decode a raw payload into a record plus its validated position.
///
/// Rejects non-UTF-8 bytes, malformed JSON, missing required fields, an empty
/// agent id, and non-finite or out-of-range coordinates. Coordinates are
/// validated here because the geohash encoder requires well-formed input.
pub fn decode(payload: &[u8]) -> Result<AgentRecord, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let wire: LocationPayload = serde_json::from_str(text).map_err(DecodeError::Json)?;

    if wire.driver_id.is_empty() {
        return Err(DecodeError::EmptyAgentId);
    }

    let position = Position::new(wire.driver_location.latitude, wire.driver_location.longitude);
    if !position.in_range() {
        return Err(DecodeError::CoordinateOutOfRange {
            latitude: position.latitude,
            longitude: position.longitude,
        });
    }

    Ok(AgentRecord::new(AgentId::new(wire.driver_id), position).with_attributes(wire.extra))
}
