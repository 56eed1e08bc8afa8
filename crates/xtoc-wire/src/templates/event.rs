// SPDX-License-Identifier: Apache-2.0
//! T=9 EVENT — scheduled or logged occurrence.
//!
//! ```text
//! v=1  src u16  dst u16  priority u8  status u8  t u32  typeCode u8  flags u8
//!      [loc]  [label: u8 len, utf8 <=48]  [locationLabel: u8 len, utf8 <=48]
//!      [note: u8 len, utf8 <=160]  [startAt u32]  [endAt u32]  [srcIds]
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Event;

/// Flag bits gating EVENT's optional trailers.
pub mod flags {
    /// Payload carries a location.
    pub const LOC: u8 = 1 << 0;
    /// Payload carries a short label.
    pub const LABEL: u8 = 1 << 1;
    /// Payload carries a human-readable location label.
    pub const LOCATION_LABEL: u8 = 1 << 2;
    /// Payload carries a free-text note.
    pub const NOTE: u8 = 1 << 3;
    /// Payload carries a start timestamp.
    pub const START_AT: u8 = 1 << 4;
    /// Payload carries an end timestamp.
    pub const END_AT: u8 = 1 << 5;
    /// Payload carries extra source ids.
    pub const SRC_IDS: u8 = 1 << 6;
}

/// Maximum byte length of the `label` field.
pub const LABEL_CAP: usize = 48;
/// Maximum byte length of the `locationLabel` field.
pub const LOCATION_LABEL_CAP: usize = 48;
/// Maximum byte length of the `note` field.
pub const NOTE_CAP: usize = 160;

/// Decoded EVENT payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Source station/unit id.
    pub src: u16,
    /// Destination station/unit id.
    pub dst: u16,
    /// Priority code.
    pub priority: u8,
    /// Status code.
    pub status: u8,
    /// Unix milliseconds (minute precision) this record was composed.
    pub t: u64,
    /// Event type code.
    pub type_code: u8,
    /// Location, if carried.
    pub loc: Option<Location>,
    /// Short label, if carried.
    pub label: Option<String>,
    /// Human-readable location label, if carried.
    pub location_label: Option<String>,
    /// Free-text note, if carried.
    pub note: Option<String>,
    /// Start timestamp, if carried.
    pub start_at: Option<u64>,
    /// End timestamp, if carried.
    pub end_at: Option<u64>,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode an [`Event`] to its binary payload.
pub fn encode(v: &Event) -> Vec<u8> {
    let mut flag_byte = 0u8;
    if v.loc.is_some() {
        flag_byte |= flags::LOC;
    }
    if v.label.is_some() {
        flag_byte |= flags::LABEL;
    }
    if v.location_label.is_some() {
        flag_byte |= flags::LOCATION_LABEL;
    }
    if v.note.is_some() {
        flag_byte |= flags::NOTE;
    }
    if v.start_at.is_some() {
        flag_byte |= flags::START_AT;
    }
    if v.end_at.is_some() {
        flag_byte |= flags::END_AT;
    }
    let extras: Vec<u16> = v.src_ids.iter().copied().filter(|&id| id != v.src).collect();
    if !extras.is_empty() {
        flag_byte |= flags::SRC_IDS;
    }

    let mut w = ByteWriter::with_capacity(13);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u16(v.dst);
    w.write_u8(v.priority);
    w.write_u8(v.status);
    w.write_u32(encode_minutes(v.t));
    w.write_u8(v.type_code);
    w.write_u8(flag_byte);
    if let Some(loc) = v.loc {
        write_location(&mut w, loc);
    }
    if let Some(label) = &v.label {
        w.write_str_u8(label, LABEL_CAP);
    }
    if let Some(location_label) = &v.location_label {
        w.write_str_u8(location_label, LOCATION_LABEL_CAP);
    }
    if let Some(note) = &v.note {
        w.write_str_u8(note, NOTE_CAP);
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
    w.into_vec()
}

/// Decode an EVENT binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Event, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let dst = r.read_u16("dst")?;
    let priority = r.read_u8("priority")?;
    let status = r.read_u8("status")?;
    let t = decode_minutes(r.read_u32("t")?);
    let type_code = r.read_u8("typeCode")?;
    let flag_byte = r.read_u8("flags")?;

    let loc = (flag_byte & flags::LOC != 0).then(|| read_location(&mut r)).transpose()?;
    let label = (flag_byte & flags::LABEL != 0)
        .then(|| r.read_str_u8("label"))
        .transpose()?;
    let location_label = (flag_byte & flags::LOCATION_LABEL != 0)
        .then(|| r.read_str_u8("locationLabel"))
        .transpose()?;
    let note = (flag_byte & flags::NOTE != 0)
        .then(|| r.read_str_u8("note"))
        .transpose()?;
    let start_at = (flag_byte & flags::START_AT != 0)
        .then(|| r.read_u32("startAt"))
        .transpose()?
        .map(decode_minutes);
    let end_at = (flag_byte & flags::END_AT != 0)
        .then(|| r.read_u32("endAt"))
        .transpose()?
        .map(decode_minutes);
    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(Event {
        src,
        dst,
        priority,
        status,
        t,
        type_code,
        loc,
        label,
        location_label,
        note,
        start_at,
        end_at,
        src_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Event {
        Event {
            src: 9,
            dst: 0,
            priority: 1,
            status: 2,
            t: 60_000,
            type_code: 4,
            loc: Some(Location { lat: 12.0, lon: 45.0 }),
            label: Some("Muster".to_owned()),
            location_label: Some("Parade ground".to_owned()),
            note: Some("all hands".to_owned()),
            start_at: Some(120_000),
            end_at: Some(180_000),
            src_ids: vec![9],
        }
    }

    #[test]
    fn round_trips() {
        let v = sample();
        assert_eq!(decode(&encode(&v)).unwrap(), v);
    }

    #[test]
    fn minimal_size_is_thirteen_bytes() {
        let v = Event {
            src: 0,
            dst: 0,
            priority: 0,
            status: 0,
            t: 0,
            type_code: 0,
            loc: None,
            label: None,
            location_label: None,
            note: None,
            start_at: None,
            end_at: None,
            src_ids: vec![0],
        };
        assert_eq!(encode(&v).len(), 13);
    }

    #[test]
    fn note_truncates_to_cap() {
        let v = Event {
            note: Some("n".repeat(500)),
            ..sample()
        };
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded.note.unwrap().len(), NOTE_CAP);
    }
}
