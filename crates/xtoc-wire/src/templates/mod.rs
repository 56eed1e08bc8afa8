// SPDX-License-Identifier: Apache-2.0
//! The eleven XTOC binary template codecs, plus a unifying [`Template`]
//! enum that dispatches on [`TemplateId`] so callers (the packet store,
//! the backup importer) don't need a match arm per template.

pub mod asset;
pub mod checkin;
pub mod common;
pub mod contact;
pub mod event;
pub mod mission;
pub mod phaseline;
pub mod resource;
pub mod sentinel;
pub mod sitrep;
pub mod task;
pub mod zone;

use crate::error::{CodecError, TemplateId};
use common::Location;

/// A decoded packet body, tagged by which template produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// T=1 SITREP.
    Sitrep(sitrep::Sitrep),
    /// T=2 CONTACT.
    Contact(contact::Contact),
    /// T=3 TASK.
    Task(task::Task),
    /// T=4 CHECKIN/LOC.
    Checkin(checkin::Checkin),
    /// T=5 RESOURCE.
    Resource(resource::Resource),
    /// T=6 ASSET.
    Asset(asset::Asset),
    /// T=7 ZONE.
    Zone(zone::Zone),
    /// T=8 MISSION.
    Mission(mission::Mission),
    /// T=9 EVENT.
    Event(event::Event),
    /// T=10 PHASE LINE.
    PhaseLine(phaseline::PhaseLine),
    /// T=11 SENTINEL.
    Sentinel(sentinel::Sentinel),
}

impl Template {
    /// The template this record was decoded as (or will be encoded as).
    pub const fn template_id(&self) -> TemplateId {
        match self {
            Self::Sitrep(_) => TemplateId::Sitrep,
            Self::Contact(_) => TemplateId::Contact,
            Self::Task(_) => TemplateId::Task,
            Self::Checkin(_) => TemplateId::Checkin,
            Self::Resource(_) => TemplateId::Resource,
            Self::Asset(_) => TemplateId::Asset,
            Self::Zone(_) => TemplateId::Zone,
            Self::Mission(_) => TemplateId::Mission,
            Self::Event(_) => TemplateId::Event,
            Self::PhaseLine(_) => TemplateId::PhaseLine,
            Self::Sentinel(_) => TemplateId::Sentinel,
        }
    }

    /// Decode `bytes` as the template named by `id`.
    ///
    /// # Errors
    ///
    /// See [`CodecError`].
    pub fn decode(id: TemplateId, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(match id {
            TemplateId::Sitrep => Self::Sitrep(sitrep::decode(bytes)?),
            TemplateId::Contact => Self::Contact(contact::decode(bytes)?),
            TemplateId::Task => Self::Task(task::decode(bytes)?),
            TemplateId::Checkin => Self::Checkin(checkin::decode(bytes)?),
            TemplateId::Resource => Self::Resource(resource::decode(bytes)?),
            TemplateId::Asset => Self::Asset(asset::decode(bytes)?),
            TemplateId::Zone => Self::Zone(zone::decode(bytes)?),
            TemplateId::Mission => Self::Mission(mission::decode(bytes)?),
            TemplateId::Event => Self::Event(event::decode(bytes)?),
            TemplateId::PhaseLine => Self::PhaseLine(phaseline::decode(bytes)?),
            TemplateId::Sentinel => Self::Sentinel(sentinel::decode(bytes)?),
        })
    }

    /// Encode this record back to its binary payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidField`] for templates with shape
    /// invariants (ZONE, PHASE LINE, SENTINEL, CHECKIN v2) if the
    /// in-memory value violates them.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(match self {
            Self::Sitrep(v) => sitrep::encode(v),
            Self::Contact(v) => contact::encode(v),
            Self::Task(v) => task::encode(v),
            Self::Checkin(v) => {
                if v.unit_ids.len() == 1 {
                    checkin::encode_v1(v.unit_id, v.lat, v.lon, v.t, v.status)
                } else {
                    checkin::encode_v2(&v.unit_ids, v.lat, v.lon, v.t, v.status)?
                }
            }
            Self::Resource(v) => resource::encode(v),
            Self::Asset(v) => asset::encode(v),
            Self::Zone(v) => zone::encode(v)?,
            Self::Mission(v) => mission::encode(v),
            Self::Event(v) => event::encode(v),
            Self::PhaseLine(v) => phaseline::encode(v)?,
            Self::Sentinel(v) => sentinel::encode(v)?,
        })
    }

    /// The primary location carried by this record, if any, for feature
    /// derivation (map display, GeoJSON export).
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Sitrep(v) => v.loc,
            Self::Contact(v) => v.loc,
            Self::Task(v) => v.loc,
            Self::Checkin(v) => Some(Location { lat: v.lat, lon: v.lon }),
            Self::Resource(v) => v.loc,
            Self::Asset(v) => v.loc,
            Self::Zone(v) => match &v.shape {
                zone::Shape::Polygon(points) => points.first().copied(),
                zone::Shape::Circle { center, .. } => Some(*center),
            },
            Self::Mission(v) => v.loc,
            Self::Event(v) => v.loc,
            Self::PhaseLine(v) => v.points.first().copied(),
            Self::Sentinel(v) => Some(Location { lat: v.lat, lon: v.lon }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_template_id() {
        let sitrep = sitrep::Sitrep {
            src: 1,
            dst: 2,
            priority: 0,
            status: 0,
            t: 0,
            loc: Some(Location { lat: 1.0, lon: 2.0 }),
            note: None,
            src_ids: vec![1],
        };
        let bytes = sitrep::encode(&sitrep);
        let decoded = Template::decode(TemplateId::Sitrep, &bytes).unwrap();
        assert_eq!(decoded.template_id(), TemplateId::Sitrep);
        assert_eq!(decoded.location(), Some(Location { lat: 1.0, lon: 2.0 }));
        assert_eq!(decoded.encode().unwrap(), bytes);
    }
}
