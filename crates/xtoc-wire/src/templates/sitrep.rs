// SPDX-License-Identifier: Apache-2.0
//! T=1 SITREP — situation report.
//!
//! ```text
//! v=1  src u16  dst u16  priority u8  status u8  t u32  flags u8
//!      [loc: lat i32, lon i32]            if flags & LOC
//!      [note: u8 len, utf8 <=120]         if flags & NOTE
//!      [srcIds: u8 count, u16 ids...]     if flags & SRC_IDS
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Sitrep;

/// Flag bits gating SITREP's optional trailers.
pub mod flags {
    /// Payload carries a [`super::Location`](super::super::common::Location).
    pub const LOC: u8 = 1 << 0;
    /// Payload carries a free-text note.
    pub const NOTE: u8 = 1 << 1;
    /// Payload carries extra source ids beyond `src`.
    pub const SRC_IDS: u8 = 1 << 2;
}

/// Maximum byte length of the `note` field.
pub const NOTE_CAP: usize = 120;

/// Decoded SITREP payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Sitrep {
    /// Source station/unit id.
    pub src: u16,
    /// Destination station/unit id.
    pub dst: u16,
    /// Priority code.
    pub priority: u8,
    /// Status code.
    pub status: u8,
    /// Unix milliseconds (minute precision) this report was composed.
    pub t: u64,
    /// Reporting location, if carried.
    pub loc: Option<Location>,
    /// Free-text note, if carried (truncated to [`NOTE_CAP`] bytes).
    pub note: Option<String>,
    /// `src` followed by deduplicated extra source ids, if carried.
    pub src_ids: Vec<u16>,
}

/// Encode a [`Sitrep`] to its binary payload.
pub fn encode(v: &Sitrep) -> Vec<u8> {
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

    let mut w = ByteWriter::with_capacity(12);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u16(v.dst);
    w.write_u8(v.priority);
    w.write_u8(v.status);
    w.write_u32(encode_minutes(v.t));
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

/// Decode a SITREP binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Sitrep, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    let version = r.read_u8("version")?;
    require_version(version, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let dst = r.read_u16("dst")?;
    let priority = r.read_u8("priority")?;
    let status = r.read_u8("status")?;
    let t = decode_minutes(r.read_u32("t")?);
    let flag_byte = r.read_u8("flags")?;

    let loc = if flag_byte & flags::LOC != 0 {
        Some(read_location(&mut r)?)
    } else {
        None
    };
    let note = if flag_byte & flags::NOTE != 0 {
        Some(r.read_str_u8("note")?)
    } else {
        None
    };
    let src_ids = if flag_byte & flags::SRC_IDS != 0 {
        read_extra_src_ids(&mut r, src)?
    } else {
        vec![src]
    };

    Ok(Sitrep {
        src,
        dst,
        priority,
        status,
        t,
        loc,
        note,
        src_ids,
    })
}
