//! Handler for the `encode` utility command.

use crate::cli::EncodeArgs;
use crate::domain::Position;
use crate::error::{ConfigError, Result};
use crate::geohash;

/// Encode a coordinate pair and print the bucket key.
pub fn execute(args: &EncodeArgs) -> Result<()> {
    if !(1..=12).contains(&args.precision) {
        return Err(ConfigError::InvalidValue {
            field: "precision",
            reason: format!("{} is not in 1..=12", args.precision),
        }
        .into());
    }

    let position = Position::new(args.latitude, args.longitude);
    if !position.in_range() {
        return Err(ConfigError::InvalidValue {
            field: "coordinates",
            reason: format!(
                "({}, {}) is outside [-90,90] x [-180,180]",
                args.latitude, args.longitude
            ),
        }
        .into());
    }

    println!(
        "{}",
        geohash::encode(args.latitude, args.longitude, args.precision)
    );
    Ok(())
}
