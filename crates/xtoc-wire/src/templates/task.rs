// SPDX-License-Identifier: Apache-2.0
//! T=3 TASK — tasking order.
//!
//! ```text
//! v=1  src u16  dst u16  priority u8  t u32  actionCode u8  dueMinutes u16  flags u8
//!      [loc]  [note: u8 len, utf8 <=120]  [srcIds]
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Task;

/// Flag bits gating TASK's optional trailers.
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

/// Decoded TASK payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Source (tasking) station/unit id.
    pub src: u16,
    /// Destination (tasked) station/unit id.
    pub dst: u16,
    /// Priority code.
    pub priority: u8,
    /// Unix milliseconds (minute precision) the task was issued.
    pub t: u64,
    /// Action code.
    pub action_code: u8,
    /// Minutes until due, relative to `t`.
    pub due_minutes: u16,
    /// Task location, if carried.
    pub loc: Option<Location>,
    /// Free-text note, if carried.
    pub note: Option<String>,
    /// `src` followed by deduplicated extra source ids.
    pub src_ids: Vec<u16>,
}

/// Encode a [`Task`] to its binary payload.
pub fn encode(v: &Task) -> Vec<u8> {
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

    let mut w = ByteWriter::with_capacity(14);
    w.write_u8(VERSION);
    w.write_u16(v.src);
    w.write_u16(v.dst);
    w.write_u8(v.priority);
    w.write_u32(encode_minutes(v.t));
    w.write_u8(v.action_code);
    w.write_u16(v.due_minutes);
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

/// Decode a TASK binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Task, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let src = r.read_u16("src")?;
    let dst = r.read_u16("dst")?;
    let priority = r.read_u8("priority")?;
    let t = decode_minutes(r.read_u32("t")?);
    let action_code = r.read_u8("actionCode")?;
    let due_minutes = r.read_u16("dueMinutes")?;
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

    Ok(Task {
        src,
        dst,
        priority,
        t,
        action_code,
        due_minutes,
        loc,
        note,
        src_ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            src: 1,
            dst: 2,
            priority: 3,
            t: 180_000,
            action_code: 9,
            due_minutes: 45,
            loc: Some(Location { lat: -12.5, lon: 130.0 }),
            note: Some("resupply".to_owned()),
            src_ids: vec![1],
        }
    }

    #[test]
    fn round_trips() {
        let v = sample();
        assert_eq!(decode(&encode(&v)).unwrap(), v);
    }

    #[test]
    fn minimal_size_is_fourteen_bytes() {
        let v = Task {
            src: 0,
            dst: 0,
            priority: 0,
            t: 0,
            action_code: 0,
            due_minutes: 0,
            loc: None,
            note: None,
            src_ids: vec![0],
        };
        assert_eq!(encode(&v).len(), 14);
    }
}
