//! Geohash encoding.
//!
//! Maps a (latitude, longitude, precision) triple to a fixed-length base-32
//! bucket key using the standard interleaved-bit algorithm: successively
//! bisect the longitude and latitude ranges (longitude first), accumulating
//! five bits per output character.

/// The geohash base-32 alphabet (no "a", "i", "l", "o").
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a coordinate pair into a geohash of exactly `precision` characters.
///
/// Deterministic and side-effect free. Callers must reject NaN and
/// out-of-range coordinates before invoking; behavior for such input is
/// undefined (guarded by a debug assertion).
///
/// At precision 5 a cell covers roughly 4.9 km x 4.9 km.
#[must_use]
pub fn encode(latitude: f64, longitude: f64, precision: usize) -> String {
    debug_assert!(
        latitude.is_finite() && longitude.is_finite(),
        "geohash::encode requires finite coordinates"
    );
    debug_assert!(
        (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude),
        "geohash::encode requires in-range coordinates"
    );

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);

    let mut out = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut ch = 0usize;
    let mut even_bit = true; // longitude first

    while out.len() < precision {
        if even_bit {
            let mid = (lon_range.0 + lon_range.1) / 2.0;
            if longitude >= mid {
                ch = ch * 2 + 1;
                lon_range.0 = mid;
            } else {
                ch *= 2;
                lon_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if latitude >= mid {
                ch = ch * 2 + 1;
                lat_range.0 = mid;
            } else {
                ch *= 2;
                lat_range.1 = mid;
            }
        }
        even_bit = !even_bit;
        bits += 1;

        if bits == 5 {
            out.push(BASE32[ch] as char);
            bits = 0;
            ch = 0;
        }
    }

    out
}
