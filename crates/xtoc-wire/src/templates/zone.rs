// SPDX-License-Identifier: Apache-2.0
//! T=7 ZONE — area of interest/hazard.
//!
//! ```text
//! v=1  src u16  threat u8  meaningCode u8  t u32  flags u8
//!      [label: u8 len, utf8 <=48]  [note: u8 len, utf8 <=120]
//!      shape is polygon unless the circle flag is set:
//!        polygon: pointCount u8 (3..=32), (lat i32, lon i32) * pointCount
//!        circle:  centerLat i32  centerLon i32  radiusMetres u16
//!      [srcIds]
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_coord, decode_minutes, encode_coord, encode_minutes, read_extra_src_ids,
    require_version, write_extra_src_ids, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Zone;

/// Flag bits gating ZONE's optional trailers and shape.
pub mod flags {
    /// Payload carries a short label.
    pub const LABEL: u8 = 1 << 0;
    /// Payload carries a free-text note.
    pub const NOTE: u8 = 1 << 1;
    /// Shape is a circle (centre + radius) rather than a polygon.
    pub const CIRCLE: u8 = 1 << 2;
    /// Payload carries extra source ids.
    pub const SRC_IDS: u8 = 1 << 3;
}

/// Maximum byte length of the `label` field.
pub const LABEL_CAP: usize = 48;
/// Maximum byte length of the `note` field.
pub const NOTE_CAP: usize = 120;
/// Minimum vertex count for a polygon shape.
pub const MIN_POLYGON_POINTS: usize = 3;
/// Maximum vertex count for a polygon shape.
pub const MAX_POLYGON_POINTS: usize = 32;

/// The geometry carried by a ZONE payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A closed polygon, 3 to 32 vertices.
    Polygon(Vec<Location>),
    /// A circle described by centre point and radius in metres.
    Circle {
        /// Circle centre.
        center: Location,
        /// Radius in metres, saturated to `u16::MAX`.
        radius_metres: u16,
    },
}

/// Decoded ZONE payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Source station/unit id.
    pub src: u16,
    /// Threat level code.
    pub threat: u8,
    /// Meaning/purpose code (e.g. hazard, restricted, assembly area).
    pub meaning_code: u8,
    /// Unix milliseconds (minute precision) of the report.
    pub t: u64,
    /// Short label, if carried.
    pub label: Option<String>,
    /// Free-text note, if carried.
    pub note: Option<String>,
    /// Zone geometry.
    pub shape: Shape,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode a [`Zone`] to its binary payload.
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] if a polygon shape does not have
/// between [`MIN_POLYGON_POINTS`] and [`MAX_POLYGON_POINTS`] vertices.
pub fn encode(v: &Zone) -> Result<Vec<u8>, CodecError> {
    if let Shape::Polygon(points) = &v.shape {
        if !(MIN_POLYGON_POINTS..=MAX_POLYGON_POINTS).contains(&points.len()) {
            return Err(CodecError::InvalidField {
                template: TEMPLATE,
                field: "pointCount",
                reason: format!(
                    "polygon must have between {MIN_POLYGON_POINTS} and {MAX_POLYGON_POINTS} points, got {}",
                    points.len()
                ),
            });
        }
    }

    let mut flag_byte = 0u8;
    if v.label.is_some() {
        flag_byte |= flags::LABEL;
    }
    if v.note.is_some() {
        flag_byte |= flags::NOTE;
    }
    if matches!(v.shape, Shape::Circle { .. }) {
        flag_byte |= flags::CIRCLE;
    }
    let extras: Vec<u16> = v.src_ids.iter().copied().filter(|&id| id != v.src).collect();
    if !extras.is_empty() {
        flag_byte |= flags::SRC_IDS;
    }

    let mut w = ByteWriter::with_capacity(9);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u8(v.threat);
    w.write_u8(v.meaning_code);
    w.write_u32(encode_minutes(v.t));
    w.write_u8(flag_byte);
    if let Some(label) = &v.label {
        w.write_str_u8(label, LABEL_CAP);
    }
    if let Some(note) = &v.note {
        w.write_str_u8(note, NOTE_CAP);
    }
    match &v.shape {
        Shape::Polygon(points) => {
            #[allow(clippy::cast_possible_truncation)]
            w.write_u8(points.len() as u8);
            for p in points {
                w.write_i32(encode_coord(p.lat));
                w.write_i32(encode_coord(p.lon));
            }
        }
        Shape::Circle { center, radius_metres } => {
            w.write_i32(encode_coord(center.lat));
            w.write_i32(encode_coord(center.lon));
            w.write_u16(*radius_metres);
        }
    }
    if flag_byte & flags::SRC_IDS != 0 {
        write_extra_src_ids(&mut w, &extras);
    }
    Ok(w.into_vec())
}

/// Decode a ZONE binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Zone, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let threat = r.read_u8("threat")?;
    let meaning_code = r.read_u8("meaningCode")?;
    let t = decode_minutes(r.read_u32("t")?);
    let flag_byte = r.read_u8("flags")?;

    let label = (flag_byte & flags::LABEL != 0)
        .then(|| r.read_str_u8("label"))
        .transpose()?;
    let note = (flag_byte & flags::NOTE != 0)
        .then(|| r.read_str_u8("note"))
        .transpose()?;

    let shape = if flag_byte & flags::CIRCLE != 0 {
        let lat = decode_coord(r.read_i32("centerLat")?);
        let lon = decode_coord(r.read_i32("centerLon")?);
        let radius_metres = r.read_u16("radiusMetres")?;
        Shape::Circle {
            center: Location { lat, lon },
            radius_metres,
        }
    } else {
        let count = r.read_u8("pointCount")? as usize;
        if !(MIN_POLYGON_POINTS..=MAX_POLYGON_POINTS).contains(&count) {
            return Err(CodecError::InvalidField {
                template: TEMPLATE,
                field: "pointCount",
                reason: format!(
                    "polygon must have between {MIN_POLYGON_POINTS} and {MAX_POLYGON_POINTS} points, got {count}"
                ),
            });
        }
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let lat = decode_coord(r.read_i32("lat")?);
            let lon = decode_coord(r.read_i32("lon")?);
            points.push(Location { lat, lon });
        }
        Shape::Polygon(points)
    };

    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(Zone {
        src,
        threat,
        meaning_code,
        t,
        label,
        note,
        shape,
        src_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn polygon_sample(n: usize) -> Zone {
        let points = (0..n)
            .map(|i| Location {
                lat: i as f64 * 0.01,
                lon: -(i as f64) * 0.01,
            })
            .collect();
        Zone {
            src: 7,
            threat: 2,
            meaning_code: 1,
            t: 60_000,
            label: Some("Danger area".to_owned()),
            note: Some("unexploded ordnance".to_owned()),
            shape: Shape::Polygon(points),
            src_ids: vec![7],
        }
    }

    #[test]
    fn polygon_round_trips() {
        let v = polygon_sample(5);
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn circle_round_trips() {
        let v = Zone {
            src: 7,
            threat: 0,
            meaning_code: 2,
            t: 0,
            label: None,
            note: None,
            shape: Shape::Circle {
                center: Location { lat: 0.0, lon: 0.0 },
                radius_metres: 100,
            },
            src_ids: vec![7],
        };
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn polygon_minimum_three_points_accepted() {
        assert!(encode(&polygon_sample(3)).is_ok());
    }

    #[test]
    fn polygon_maximum_thirty_two_points_accepted() {
        assert!(encode(&polygon_sample(32)).is_ok());
    }

    #[test]
    fn polygon_two_points_rejected() {
        assert!(encode(&polygon_sample(2)).is_err());
    }

    #[test]
    fn polygon_thirty_three_points_rejected() {
        assert!(encode(&polygon_sample(33)).is_err());
    }

    #[test]
    fn circle_flag_bit_selects_shape_without_a_separate_tag_byte() {
        let v = Zone {
            label: None,
            note: None,
            ..polygon_sample(3)
        };
        let bytes = encode(&v).unwrap();
        // version(1) src(2) threat(1) meaning(1) t(4) = 9 bytes before flags.
        assert_eq!(bytes[9] & flags::CIRCLE, 0);

        let circle = Zone {
            shape: Shape::Circle {
                center: Location { lat: 0.0, lon: 0.0 },
                radius_metres: 50,
            },
            ..v
        };
        let bytes = encode(&circle).unwrap();
        assert_ne!(bytes[9] & flags::CIRCLE, 0);
    }

    #[test]
    fn truncated_circle_payload_rejected() {
        let v = Zone {
            label: None,
            note: None,
            shape: Shape::Circle {
                center: Location { lat: 0.0, lon: 0.0 },
                radius_metres: 50,
            },
            ..polygon_sample(3)
        };
        let bytes = encode(&v).unwrap();
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
    }
}
