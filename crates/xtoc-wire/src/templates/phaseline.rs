// SPDX-License-Identifier: Apache-2.0
//! T=10 PHASE LINE — control-measure polyline.
//!
//! ```text
//! v=1  id: u8 len, utf8 <=32   src u16  status u8  kind u8  style u8  color u8
//!      updatedAt u32  createdAt u32  flags u8
//!      pointCount u8 (2..=32)  (lat i32, lon i32) * pointCount
//!      [label: u8 len, utf8 <=48]  [instruction: u8 len, utf8 <=160]
//!      [startAt u32]  [endAt u32]  [srcIds]
//! ```
//!
//! `autoDetectCross` carries no trailer bytes of its own: it is a bare
//! flag bit reflecting a boolean field on the decoded record.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_coord, decode_minutes, encode_coord, encode_minutes, read_extra_src_ids,
    require_version, write_extra_src_ids, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::PhaseLine;

/// Flag bits gating PHASE LINE's optional trailers and boolean fields.
pub mod flags {
    /// Payload carries a short label.
    pub const LABEL: u8 = 1 << 0;
    /// Payload carries a free-text instruction.
    pub const INSTRUCTION: u8 = 1 << 1;
    /// Payload carries a start timestamp.
    pub const START_AT: u8 = 1 << 2;
    /// Payload carries an end timestamp.
    pub const END_AT: u8 = 1 << 3;
    /// Payload carries extra source ids.
    pub const SRC_IDS: u8 = 1 << 4;
    /// The line should be treated as an auto-detect-cross trigger.
    pub const AUTO_DETECT_CROSS: u8 = 1 << 5;
}

/// Maximum byte length of `id`.
pub const ID_CAP: usize = 32;
/// Maximum byte length of `label`.
pub const LABEL_CAP: usize = 48;
/// Maximum byte length of `instruction`.
pub const INSTRUCTION_CAP: usize = 160;
/// Minimum vertex count for the polyline.
pub const MIN_POINTS: usize = 2;
/// Maximum vertex count for the polyline.
pub const MAX_POINTS: usize = 32;

/// Decoded PHASE LINE payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseLine {
    /// Stable line identifier.
    pub id: String,
    /// Source station/unit id.
    pub src: u16,
    /// Status code.
    pub status: u8,
    /// Line kind code (e.g. limit of advance, boundary, checkpoint chain).
    pub kind: u8,
    /// Stroke style code.
    pub style: u8,
    /// Display color code.
    pub color: u8,
    /// Unix milliseconds (minute precision) last updated.
    pub updated_at: u64,
    /// Unix milliseconds (minute precision) created.
    pub created_at: u64,
    /// Vertices, 2 to 32 points, in order.
    pub points: Vec<Location>,
    /// Short label, if carried.
    pub label: Option<String>,
    /// Free-text instruction, if carried.
    pub instruction: Option<String>,
    /// Effective-from timestamp, if carried.
    pub start_at: Option<u64>,
    /// Effective-until timestamp, if carried.
    pub end_at: Option<u64>,
    /// Whether crossing this line should raise an automatic alert.
    pub auto_detect_cross: bool,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode a [`PhaseLine`] to its binary payload.
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] if `points.len()` is not in
/// `2..=32`.
pub fn encode(v: &PhaseLine) -> Result<Vec<u8>, CodecError> {
    if !(MIN_POINTS..=MAX_POINTS).contains(&v.points.len()) {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "pointCount",
            reason: format!(
                "must have between {MIN_POINTS} and {MAX_POINTS} points, got {}",
                v.points.len()
            ),
        });
    }

    let mut flag_byte = 0u8;
    if v.label.is_some() {
        flag_byte |= flags::LABEL;
    }
    if v.instruction.is_some() {
        flag_byte |= flags::INSTRUCTION;
    }
    if v.start_at.is_some() {
        flag_byte |= flags::START_AT;
    }
    if v.end_at.is_some() {
        flag_byte |= flags::END_AT;
    }
    if v.auto_detect_cross {
        flag_byte |= flags::AUTO_DETECT_CROSS;
    }
    let extras: Vec<u16> = v.src_ids.iter().copied().filter(|&id| id != v.src).collect();
    if !extras.is_empty() {
        flag_byte |= flags::SRC_IDS;
    }

    let mut w = ByteWriter::with_capacity(16 + v.points.len() * 8);
    w.write_u8(VERSION);
    w.write_str_u8(&v.id, ID_CAP);
    w.write_u16(v.src);
    w.write_u8(v.status);
    w.write_u8(v.kind);
    w.write_u8(v.style);
    w.write_u8(v.color);
    w.write_u32(encode_minutes(v.updated_at));
    w.write_u32(encode_minutes(v.created_at));
    w.write_u8(flag_byte);
    #[allow(clippy::cast_possible_truncation)]
    w.write_u8(v.points.len() as u8);
    for p in &v.points {
        w.write_i32(encode_coord(p.lat));
        w.write_i32(encode_coord(p.lon));
    }
    if let Some(label) = &v.label {
        w.write_str_u8(label, LABEL_CAP);
    }
    if let Some(instruction) = &v.instruction {
        w.write_str_u8(instruction, INSTRUCTION_CAP);
    }
    if let Some(start_at) = v.start_at {
        w.write_u32(encode_minutes(start_at));
    }
    if let Some(end_at) = v.end_at {
        w.write_u32(encode_minutes(end_at));
    }
    if flag_byte & flags::SRC_IDS != 0 {
        write_extra_src_ids(&mut w, &extras);
    }
    Ok(w.into_vec())
}

/// Decode a PHASE LINE binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<PhaseLine, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let id = r.read_str_u8("id")?;
    let src = r.read_u16("src")?;
    let status = r.read_u8("status")?;
    let kind = r.read_u8("kind")?;
    let style = r.read_u8("style")?;
    let color = r.read_u8("color")?;
    let updated_at = decode_minutes(r.read_u32("updatedAt")?);
    let created_at = decode_minutes(r.read_u32("createdAt")?);
    let flag_byte = r.read_u8("flags")?;

    let count = r.read_u8("pointCount")? as usize;
    if !(MIN_POINTS..=MAX_POINTS).contains(&count) {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "pointCount",
            reason: format!("must have between {MIN_POINTS} and {MAX_POINTS} points, got {count}"),
        });
    }
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let lat = decode_coord(r.read_i32("lat")?);
        let lon = decode_coord(r.read_i32("lon")?);
        points.push(Location { lat, lon });
    }

    let label = (flag_byte & flags::LABEL != 0)
        .then(|| r.read_str_u8("label"))
        .transpose()?;
    let instruction = (flag_byte & flags::INSTRUCTION != 0)
        .then(|| r.read_str_u8("instruction"))
        .transpose()?;
    let start_at = (flag_byte & flags::START_AT != 0)
        .then(|| r.read_u32("startAt"))
        .transpose()?
        .map(decode_minutes);
    let end_at = (flag_byte & flags::END_AT != 0)
        .then(|| r.read_u32("endAt"))
        .transpose()?
        .map(decode_minutes);
    let auto_detect_cross = flag_byte & flags::AUTO_DETECT_CROSS != 0;
    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(PhaseLine {
        id,
        src,
        status,
        kind,
        style,
        color,
        updated_at,
        created_at,
        points,
        label,
        instruction,
        start_at,
        end_at,
        auto_detect_cross,
        src_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(n: usize) -> PhaseLine {
        let points = (0..n)
            .map(|i| Location {
                lat: i as f64 * 0.1,
                lon: i as f64 * -0.1,
            })
            .collect();
        PhaseLine {
            id: "PL-9".to_owned(),
            src: 3,
            status: 1,
            kind: 2,
            style: 0,
            color: 5,
            updated_at: 120_000,
            created_at: 60_000,
            points,
            label: Some("Phase Blue".to_owned()),
            instruction: Some("hold until relieved".to_owned()),
            start_at: Some(60_000),
            end_at: Some(300_000),
            auto_detect_cross: true,
            src_ids: vec![3],
        }
    }

    #[test]
    fn round_trips() {
        let v = sample(4);
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn minimum_two_points_accepted() {
        assert!(encode(&sample(2)).is_ok());
    }

    #[test]
    fn maximum_thirty_two_points_accepted() {
        assert!(encode(&sample(32)).is_ok());
    }

    #[test]
    fn single_point_rejected() {
        assert!(encode(&sample(1)).is_err());
    }

    #[test]
    fn thirty_three_points_rejected() {
        assert!(encode(&sample(33)).is_err());
    }

    #[test]
    fn auto_detect_cross_round_trips_false() {
        let v = PhaseLine {
            auto_detect_cross: false,
            ..sample(3)
        };
        let decoded = decode(&encode(&v).unwrap()).unwrap();
        assert!(!decoded.auto_detect_cross);
    }
}
