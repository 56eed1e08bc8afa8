// SPDX-License-Identifier: Apache-2.0
//! T=4 CHECKIN/LOC — unit position check-in.
//!
//! Two coexisting schema versions:
//!
//! ```text
//! v=1 (16 bytes, single unit):
//!   v u8  unitId u16  lat i32  lon i32  t u32  status u8
//!
//! v=2 (multi-unit):
//!   v u8  unitCount u8 (1..=32)  unitId u16 * unitCount
//!   lat i32  lon i32  t u32  status u8
//! ```
//!
//! The decoder always returns `unit_ids` (one entry for v1, 1..=32 for v2)
//! and mirrors `unit_ids[0]` into `unit_id` for callers written against
//! the single-unit v1 shape.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{decode_coord, decode_minutes, encode_coord, encode_minutes};

const VERSION_1: u8 = 1;
const VERSION_2: u8 = 2;
const TEMPLATE: TemplateId = TemplateId::Checkin;

/// Minimum unit count for the v2 schema.
pub const MIN_UNITS_V2: usize = 1;
/// Maximum unit count for the v2 schema.
pub const MAX_UNITS_V2: usize = 32;

/// Decoded CHECKIN/LOC payload, normalized across v1 and v2.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkin {
    /// All unit ids carried by the payload (length 1 for v1).
    pub unit_ids: Vec<u16>,
    /// Mirror of `unit_ids[0]`, kept for v1-shaped callers.
    pub unit_id: u16,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Unix milliseconds (minute precision).
    pub t: u64,
    /// Status code.
    pub status: u8,
}

/// Encode a single-unit v1 CHECKIN payload (always 16 bytes).
pub fn encode_v1(unit_id: u16, lat: f64, lon: f64, t: u64, status: u8) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(16);
    w.write_u8(VERSION_1);
    w.write_u16(unit_id);
    w.write_i32(encode_coord(lat));
    w.write_i32(encode_coord(lon));
    w.write_u32(encode_minutes(t));
    w.write_u8(status);
    w.into_vec()
}

/// Encode a multi-unit v2 CHECKIN payload.
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] if `unit_ids.len()` is not in
/// `1..=32`.
pub fn encode_v2(
    unit_ids: &[u16],
    lat: f64,
    lon: f64,
    t: u64,
    status: u8,
) -> Result<Vec<u8>, CodecError> {
    if !(MIN_UNITS_V2..=MAX_UNITS_V2).contains(&unit_ids.len()) {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "unitCount",
            reason: format!(
                "must be between {MIN_UNITS_V2} and {MAX_UNITS_V2}, got {}",
                unit_ids.len()
            ),
        });
    }
    let mut w = ByteWriter::with_capacity(2 + unit_ids.len() * 2 + 13);
    w.write_u8(VERSION_2);
    #[allow(clippy::cast_possible_truncation)]
    w.write_u8(unit_ids.len() as u8);
    for &id in unit_ids {
        w.write_u16(id);
    }
    w.write_i32(encode_coord(lat));
    w.write_i32(encode_coord(lon));
    w.write_u32(encode_minutes(t));
    w.write_u8(status);
    Ok(w.into_vec())
}

/// Decode a CHECKIN/LOC binary payload (either schema version).
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Checkin, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    let version = r.read_u8("version")?;
    match version {
        VERSION_1 => {
            let unit_id = r.read_u16("unitId")?;
            let lat = decode_coord(r.read_i32("lat")?);
            let lon = decode_coord(r.read_i32("lon")?);
            let t = decode_minutes(r.read_u32("t")?);
            let status = r.read_u8("status")?;
            Ok(Checkin {
                unit_ids: vec![unit_id],
                unit_id,
                lat,
                lon,
                t,
                status,
            })
        }
        VERSION_2 => {
            let count = r.read_u8("unitCount")? as usize;
            if !(MIN_UNITS_V2..=MAX_UNITS_V2).contains(&count) {
                return Err(CodecError::InvalidField {
                    template: TEMPLATE,
                    field: "unitCount",
                    reason: format!("must be between {MIN_UNITS_V2} and {MAX_UNITS_V2}, got {count}"),
                });
            }
            let mut unit_ids = Vec::with_capacity(count);
            for _ in 0..count {
                unit_ids.push(r.read_u16("unitId")?);
            }
            let lat = decode_coord(r.read_i32("lat")?);
            let lon = decode_coord(r.read_i32("lon")?);
            let t = decode_minutes(r.read_u32("t")?);
            let status = r.read_u8("status")?;
            Ok(Checkin {
                unit_id: unit_ids[0],
                unit_ids,
                lat,
                lon,
                t,
                status,
            })
        }
        seen => Err(CodecError::UnsupportedVersion {
            template: TEMPLATE,
            seen,
        }),
    }
}
