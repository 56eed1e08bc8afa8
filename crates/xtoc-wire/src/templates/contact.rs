// SPDX-License-Identifier: Apache-2.0
//! T=2 CONTACT — observed-contact report.
//!
//! ```text
//! v=1  src u16  priority u8  t u32  typeCode u8  count u16  direction u8  flags u8
//!      [loc]  [note: u8 len, utf8 <=120]  [srcIds]
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Contact;

/// Flag bits gating CONTACT's optional trailers.
pub mod flags {
    /// Payload carries a location.
    pub const LOC: u8 = 1 << 0;
    /// Payload carries a free-text note.
    pub const NOTE: u8 = 1 << 1;
    /// Payload carries extra source ids.
    pub const SRC_IDS: u8 = 1 << 2;
}

/// Maximum byte length of the `note` field.
pub const NOTE_CAP: usize = 120;

/// Decoded CONTACT payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Source station/unit id.
    pub src: u16,
    /// Priority code.
    pub priority: u8,
    /// Unix milliseconds (minute precision) of the observation.
    pub t: u64,
    /// Contact type code.
    pub type_code: u8,
    /// Number of contacts observed.
    pub count: u16,
    /// Direction code (bearing bucket, or compass-point enum per convention).
    pub direction: u8,
    /// Observed location, if carried.
    pub loc: Option<Location>,
    /// Free-text note, if carried.
    pub note: Option<String>,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode a [`Contact`] to its binary payload.
pub fn encode(v: &Contact) -> Vec<u8> {
    let mut flag_byte = 0u8;
    if v.loc.is_some() {
        flag_byte |= flags::LOC;
    }
    if v.note.is_some() {
        flag_byte |= flags::NOTE;
    }
    let extras: Vec<u16> = v.src_ids.iter().copied().filter(|&id| id != v.src).collect();
    if !extras.is_empty() {
        flag_byte |= flags::SRC_IDS;
    }

    let mut w = ByteWriter::with_capacity(13);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u8(v.priority);
    w.write_u32(encode_minutes(v.t));
    w.write_u8(v.type_code);
    w.write_u16(v.count);
    w.write_u8(v.direction);
    w.write_u8(flag_byte);
    if let Some(loc) = v.loc {
        write_location(&mut w, loc);
    }
    if let Some(note) = &v.note {
        w.write_str_u8(note, NOTE_CAP);
    }
    if flag_byte & flags::SRC_IDS != 0 {
        write_extra_src_ids(&mut w, &extras);
    }
    w.into_vec()
}

/// Decode a CONTACT binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Contact, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let priority = r.read_u8("priority")?;
    let t = decode_minutes(r.read_u32("t")?);
    let type_code = r.read_u8("typeCode")?;
    let count = r.read_u16("count")?;
    let direction = r.read_u8("direction")?;
    let flag_byte = r.read_u8("flags")?;

    let loc = (flag_byte & flags::LOC != 0).then(|| read_location(&mut r)).transpose()?;
    let note = (flag_byte & flags::NOTE != 0)
        .then(|| r.read_str_u8("note"))
        .transpose()?;
    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(Contact {
        src,
        priority,
        t,
        type_code,
        count,
        direction,
        loc,
        note,
        src_ids,
    })
}
