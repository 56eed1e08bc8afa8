// SPDX-License-Identifier: Apache-2.0
//! T=8 MISSION — tasking record with lifecycle status.
//!
//! ```text
//! v=1  id: u8 len, utf8 <=32   title: u8 len, utf8 <=96
//!      statusCode u8 (0..=5)   priority u8 (low 2 bits)
//!      updatedAt u32  createdAt u32  flags u8
//!      [assignedTo u16]  [loc]  [locationLabel: u8 len, utf8 <=48]
//!      [dueAt u32]  [notes: u16 len, utf8 <=600]  [extra assignees]
//! ```
//!
//! The "extra assignees" flag bit carries additional assignee ids beyond
//! `assignedTo`. MISSION has no separate source-ids trailer: unlike the
//! other templates, a MISSION record is identified by `id`, not by a
//! reporting station, so there is no primary source id for a `srcIds`
//! list to extend.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{
    decode_minutes, encode_minutes, read_extra_src_ids, read_location, require_version,
    write_extra_src_ids, write_location, Location,
};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Mission;

/// Lifecycle status codes for a MISSION record.
pub mod status {
    /// Planned, not yet assigned.
    pub const PLANNED: u8 = 0;
    /// Assigned to a unit, not yet started.
    pub const ASSIGNED: u8 = 1;
    /// Underway.
    pub const IN_PROGRESS: u8 = 2;
    /// Paused.
    pub const ON_HOLD: u8 = 3;
    /// Finished.
    pub const COMPLETE: u8 = 4;
    /// Cancelled before completion.
    pub const ABORTED: u8 = 5;
    /// Highest valid status code.
    pub const MAX: u8 = ABORTED;
}

/// Flag bits gating MISSION's optional trailers.
pub mod flags {
    /// Payload carries a primary `assignedTo` id.
    pub const ASSIGNED_TO: u8 = 1 << 0;
    /// Payload carries a location.
    pub const LOC: u8 = 1 << 1;
    /// Payload carries a human-readable location label.
    pub const LOCATION_LABEL: u8 = 1 << 2;
    /// Payload carries a due-at timestamp.
    pub const DUE_AT: u8 = 1 << 3;
    /// Payload carries free-text notes.
    pub const NOTES: u8 = 1 << 4;
    /// Payload carries assignee ids beyond `assignedTo`.
    pub const EXTRA_ASSIGNEES: u8 = 1 << 5;
}

/// Maximum byte length of `id`.
pub const ID_CAP: usize = 32;
/// Maximum byte length of `title`.
pub const TITLE_CAP: usize = 96;
/// Maximum byte length of `locationLabel`.
pub const LOCATION_LABEL_CAP: usize = 48;
/// Maximum byte length of `notes`.
pub const NOTES_CAP: usize = 600;
/// Priority occupies the low 2 bits of its byte (values `0..=3`).
const PRIORITY_MASK: u8 = 0b11;

/// Decoded MISSION payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    /// Stable mission identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Lifecycle status, one of [`status`]'s constants.
    pub status_code: u8,
    /// Priority, `0..=3`.
    pub priority: u8,
    /// Unix milliseconds (minute precision) this record was last updated.
    pub updated_at: u64,
    /// Unix milliseconds (minute precision) this record was created.
    pub created_at: u64,
    /// Primary assignee id, if any.
    pub assigned_to: Option<u16>,
    /// `assigned_to` followed by deduplicated extra assignee ids; empty
    /// if `assigned_to` is `None`.
    pub assignee_ids: Vec<u16>,
    /// Mission location, if carried.
    pub loc: Option<Location>,
    /// Human-readable location label, if carried.
    pub location_label: Option<String>,
    /// Due-at timestamp, if carried.
    pub due_at: Option<u64>,
    /// Free-text notes, if carried.
    pub notes: Option<String>,
}

/// Encode a [`Mission`] to its binary payload.
pub fn encode(v: &Mission) -> Vec<u8> {
    let mut flag_byte = 0u8;
    if v.assigned_to.is_some() {
        flag_byte |= flags::ASSIGNED_TO;
    }
    if v.loc.is_some() {
        flag_byte |= flags::LOC;
    }
    if v.location_label.is_some() {
        flag_byte |= flags::LOCATION_LABEL;
    }
    if v.due_at.is_some() {
        flag_byte |= flags::DUE_AT;
    }
    if v.notes.is_some() {
        flag_byte |= flags::NOTES;
    }
    let extras: Vec<u16> = match v.assigned_to {
        Some(primary) => v.assignee_ids.iter().copied().filter(|&id| id != primary).collect(),
        None => Vec::new(),
    };
    if v.assigned_to.is_some() && !extras.is_empty() {
        flag_byte |= flags::EXTRA_ASSIGNEES;
    }

    let mut w = ByteWriter::with_capacity(16);
    w.write_u8(VERSION);
    w.write_str_u8(&v.id, ID_CAP);
    w.write_str_u8(&v.title, TITLE_CAP);
    w.write_u8(v.status_code.min(status::MAX));
    w.write_u8(v.priority & PRIORITY_MASK);
    w.write_u32(encode_minutes(v.updated_at));
    w.write_u32(encode_minutes(v.created_at));
    w.write_u8(flag_byte);
    if let Some(assigned_to) = v.assigned_to {
        w.write_u16(assigned_to);
    }
    if let Some(loc) = v.loc {
        write_location(&mut w, loc);
    }
    if let Some(label) = &v.location_label {
        w.write_str_u8(label, LOCATION_LABEL_CAP);
    }
    if let Some(due_at) = v.due_at {
        w.write_u32(encode_minutes(due_at));
    }
    if let Some(notes) = &v.notes {
        w.write_str_u16(notes, NOTES_CAP);
    }
    if flag_byte & flags::EXTRA_ASSIGNEES != 0 {
        write_extra_src_ids(&mut w, &extras);
    }
    w.into_vec()
}

/// Decode a MISSION binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Mission, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let id = r.read_str_u8("id")?;
    let title = r.read_str_u8("title")?;
    let status_code = r.read_u8("statusCode")?;
    if status_code > status::MAX {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "statusCode",
            reason: format!("must be 0..={}, got {status_code}", status::MAX),
        });
    }
    let priority = r.read_u8("priority")? & PRIORITY_MASK;
    let updated_at = decode_minutes(r.read_u32("updatedAt")?);
    let created_at = decode_minutes(r.read_u32("createdAt")?);
    let flag_byte = r.read_u8("flags")?;

    let assigned_to = (flag_byte & flags::ASSIGNED_TO != 0)
        .then(|| r.read_u16("assignedTo"))
        .transpose()?;
    let loc = (flag_byte & flags::LOC != 0).then(|| read_location(&mut r)).transpose()?;
    let location_label = (flag_byte & flags::LOCATION_LABEL != 0)
        .then(|| r.read_str_u8("locationLabel"))
        .transpose()?;
    let due_at = (flag_byte & flags::DUE_AT != 0)
        .then(|| r.read_u32("dueAt"))
        .transpose()?
        .map(decode_minutes);
    let notes = (flag_byte & flags::NOTES != 0)
        .then(|| r.read_str_u16("notes"))
        .transpose()?;
    let assignee_ids = match assigned_to {
        Some(primary) if flag_byte & flags::EXTRA_ASSIGNEES != 0 => read_extra_src_ids(&mut r, primary)?,
        Some(primary) => vec![primary],
        None => Vec::new(),
    };

    Ok(Mission {
        id,
        title,
        status_code,
        priority,
        updated_at,
        created_at,
        assigned_to,
        assignee_ids,
        loc,
        location_label,
        due_at,
        notes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Mission {
        Mission {
            id: "MSN-42".to_owned(),
            title: "Resupply forward post".to_owned(),
            status_code: status::ASSIGNED,
            priority: 2,
            updated_at: 120_000,
            created_at: 60_000,
            assigned_to: Some(11),
            assignee_ids: vec![11, 12],
            loc: Some(Location { lat: 4.5, lon: -1.2 }),
            location_label: Some("FOB Alpha".to_owned()),
            due_at: Some(600_000),
            notes: Some("bring extra water".to_owned()),
        }
    }

    #[test]
    fn round_trips() {
        let v = sample();
        assert_eq!(decode(&encode(&v)).unwrap(), v);
    }

    #[test]
    fn minimal_has_no_assignees() {
        let v = Mission {
            id: String::new(),
            title: String::new(),
            status_code: status::PLANNED,
            priority: 0,
            updated_at: 0,
            created_at: 0,
            assigned_to: None,
            assignee_ids: Vec::new(),
            loc: None,
            location_label: None,
            due_at: None,
            notes: None,
        };
        let decoded = decode(&encode(&v)).unwrap();
        assert!(decoded.assignee_ids.is_empty());
    }

    #[test]
    fn priority_is_masked_to_two_bits() {
        let v = Mission {
            priority: 0xFF,
            ..sample()
        };
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded.priority, 0b11);
    }

    #[test]
    fn invalid_status_code_rejected() {
        let mut bytes = encode(&sample());
        // version(1) + id prefix(1+6) + title prefix(1+22) = 31, statusCode at 31
        let status_idx = 1 + 1 + "MSN-42".len() + 1 + "Resupply forward post".len();
        bytes[status_idx] = 99;
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn notes_truncate_to_cap() {
        let v = Mission {
            notes: Some("n".repeat(1000)),
            ..sample()
        };
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded.notes.unwrap().len(), NOTES_CAP);
    }
}
