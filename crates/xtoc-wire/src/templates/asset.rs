// SPDX-License-Identifier: Apache-2.0
//! T=6 ASSET — friendly asset status report.
//!
//! ```text
//! v=1  src u16  condition u8  t u32  typeCode u8  flags u8
//!      [loc]  [label: u8 len, utf8 <=48]  [note: u8 len, utf8 <=120]  [srcIds]
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Asset;

/// Flag bits gating ASSET's optional trailers.
pub mod flags {
    /// Payload carries a location.
    pub const LOC: u8 = 1 << 0;
    /// Payload carries a short label.
    pub const LABEL: u8 = 1 << 1;
    /// Payload carries a free-text note.
    pub const NOTE: u8 = 1 << 2;
    /// Payload carries extra source ids.
    pub const SRC_IDS: u8 = 1 << 3;
}

/// Maximum byte length of the `label` field.
pub const LABEL_CAP: usize = 48;
/// Maximum byte length of the `note` field.
pub const NOTE_CAP: usize = 120;

/// Decoded ASSET payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Source (reporting) station/unit id.
    pub src: u16,
    /// Condition code.
    pub condition: u8,
    /// Unix milliseconds (minute precision) of the report.
    pub t: u64,
    /// Asset type code.
    pub type_code: u8,
    /// Location, if carried.
    pub loc: Option<Location>,
    /// Short label, if carried.
    pub label: Option<String>,
    /// Free-text note, if carried.
    pub note: Option<String>,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode an [`Asset`] to its binary payload.
pub fn encode(v: &Asset) -> Vec<u8> {
    let mut flag_byte = 0u8;
    if v.loc.is_some() {
        flag_byte |= flags::LOC;
    }
    if v.label.is_some() {
        flag_byte |= flags::LABEL;
    }
    if v.note.is_some() {
        flag_byte |= flags::NOTE;
    }
    let extras: Vec<u16> = v.src_ids.iter().copied().filter(|&id| id != v.src).collect();
    if !extras.is_empty() {
        flag_byte |= flags::SRC_IDS;
    }

    let mut w = ByteWriter::with_capacity(9);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u8(v.condition);
    w.write_u32(encode_minutes(v.t));
    w.write_u8(v.type_code);
    w.write_u8(flag_byte);
    if let Some(loc) = v.loc {
        write_location(&mut w, loc);
    }
    if let Some(label) = &v.label {
        w.write_str_u8(label, LABEL_CAP);
    }
    if let Some(note) = &v.note {
        w.write_str_u8(note, NOTE_CAP);
    }
    if flag_byte & flags::SRC_IDS != 0 {
        write_extra_src_ids(&mut w, &extras);
    }
    w.into_vec()
}

/// Decode an ASSET binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Asset, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let condition = r.read_u8("condition")?;
    let t = decode_minutes(r.read_u32("t")?);
    let type_code = r.read_u8("typeCode")?;
    let flag_byte = r.read_u8("flags")?;

    let loc = (flag_byte & flags::LOC != 0).then(|| read_location(&mut r)).transpose()?;
    let label = (flag_byte & flags::LABEL != 0)
        .then(|| r.read_str_u8("label"))
        .transpose()?;
    let note = (flag_byte & flags::NOTE != 0)
        .then(|| r.read_str_u8("note"))
        .transpose()?;
    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(Asset {
        src,
        condition,
        t,
        type_code,
        loc,
        label,
        note,
        src_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Asset {
        Asset {
            src: 6,
            condition: 2,
            t: 300_000,
            type_code: 1,
            loc: Some(Location { lat: -5.0, lon: 33.0 }),
            label: Some("Engine 7".to_owned()),
            note: Some("low on water".to_owned()),
            src_ids: vec![6],
        }
    }

    #[test]
    fn round_trips() {
        let v = sample();
        assert_eq!(decode(&encode(&v)).unwrap(), v);
    }

    #[test]
    fn minimal_size_is_nine_bytes() {
        let v = Asset {
            src: 0,
            condition: 0,
            t: 0,
            type_code: 0,
            loc: None,
            label: None,
            note: None,
            src_ids: vec![0],
        };
        assert_eq!(encode(&v).len(), 9);
    }

    #[test]
    fn label_truncates_to_cap() {
        let v = Asset {
            label: Some("x".repeat(100)),
            ..sample()
        };
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded.label.unwrap().len(), LABEL_CAP);
    }
}
