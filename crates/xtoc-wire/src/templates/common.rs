// SPDX-License-Identifier: Apache-2.0
//! Shared value encodings used by every template: 1e5-scaled fixed-point
//! coordinates, unix-minute timestamps, and the extra-source-ids trailer.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};

/// Scale factor for fixed-point coordinates (decimal degrees × `1e5`).
const COORD_SCALE: f64 = 1e5;

/// Milliseconds per unix-minute tick.
const MS_PER_MINUTE: u64 = 60_000;

/// A decoded WGS-84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Encode a decimal-degree value as `round(value * 1e5)`.
pub fn encode_coord(value: f64) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let scaled = (value * COORD_SCALE).round() as i32;
    scaled
}

/// Decode a fixed-point coordinate back to decimal degrees.
pub fn decode_coord(raw: i32) -> f64 {
    f64::from(raw) / COORD_SCALE
}

/// Write a [`Location`] as two big-endian `i32` fixed-point coordinates
/// (8 bytes: lat then lon).
pub fn write_location(w: &mut ByteWriter, loc: Location) {
    w.write_i32(encode_coord(loc.lat));
    w.write_i32(encode_coord(loc.lon));
}

/// Read a [`Location`] written by [`write_location`].
pub fn read_location(r: &mut ByteReader<'_>) -> Result<Location, CodecError> {
    let lat = decode_coord(r.read_i32("lat")?);
    let lon = decode_coord(r.read_i32("lon")?);
    Ok(Location { lat, lon })
}

/// Encode a unix-millisecond timestamp as `floor(ms / 60000)`.
pub fn encode_minutes(unix_ms: u64) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let minutes = (unix_ms / MS_PER_MINUTE) as u32;
    minutes
}

/// Decode a unix-minute timestamp back to unix milliseconds.
pub fn decode_minutes(minutes: u32) -> u64 {
    u64::from(minutes) * MS_PER_MINUTE
}

/// Maximum number of source ids (primary + extras) a decoded record may
/// carry, per the specification's "maximum 32 total" rule.
pub const MAX_SRC_IDS: usize = 32;

/// Read the `srcIds` trailer (`u8` count + that many big-endian `u16`
/// ids), prepend `primary`, dedup, and cap at [`MAX_SRC_IDS`] total.
pub fn read_extra_src_ids(
    r: &mut ByteReader<'_>,
    primary: u16,
) -> Result<Vec<u16>, CodecError> {
    let count = r.read_u8("srcIdsCount")?;
    let mut ids = Vec::with_capacity(1 + count as usize);
    ids.push(primary);
    for _ in 0..count {
        let id = r.read_u16("srcId")?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids.truncate(MAX_SRC_IDS);
    Ok(ids)
}

/// Write the `srcIds` trailer for `extra_ids` (the primary id is carried
/// separately in the fixed header and is not repeated here), deduplicated
/// and capped so that `1 + extra_ids.len() <= MAX_SRC_IDS`.
pub fn write_extra_src_ids(w: &mut ByteWriter, extra_ids: &[u16]) {
    let mut dedup: Vec<u16> = Vec::with_capacity(extra_ids.len());
    for &id in extra_ids {
        if !dedup.contains(&id) {
            dedup.push(id);
        }
    }
    dedup.truncate(MAX_SRC_IDS - 1);
    #[allow(clippy::cast_possible_truncation)]
    w.write_u8(dedup.len() as u8);
    for id in dedup {
        w.write_u16(id);
    }
}

/// Validate that a version byte matches the only version this decoder
/// supports, raising [`CodecError::UnsupportedVersion`] otherwise.
pub fn require_version(seen: u8, expected: u8, template: TemplateId) -> Result<(), CodecError> {
    if seen == expected {
        Ok(())
    } else {
        Err(CodecError::UnsupportedVersion { template, seen })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn coord_round_trips_at_extremes() {
        for v in [90.0, -90.0, 180.0, -180.0, 0.0, 40.0, -75.0] {
            let raw = encode_coord(v);
            assert!((decode_coord(raw) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn coord_quantizes_to_1e5() {
        let raw = encode_coord(0.000_001);
        assert_eq!(decode_coord(raw), 0.0);
        let raw = encode_coord(0.000_005);
        assert_eq!(raw, 1); // rounds to nearest 1e-5 step
    }

    #[test]
    fn minutes_floor_and_round_trip() {
        assert_eq!(encode_minutes(60_000), 1);
        assert_eq!(decode_minutes(1), 60_000);
        assert_eq!(encode_minutes(60_999), 1, "floors, does not round");
    }

    #[test]
    fn src_ids_dedup_and_cap() {
        let mut w = ByteWriter::new();
        let extras: Vec<u16> = (0..40).collect();
        write_extra_src_ids(&mut w, &extras);
        let bytes = w.into_vec();
        let mut r = ByteReader::new(&bytes, TemplateId::Sitrep);
        let ids = read_extra_src_ids(&mut r, 9999).unwrap();
        assert_eq!(ids.len(), MAX_SRC_IDS);
        assert_eq!(ids[0], 9999);
    }
}
