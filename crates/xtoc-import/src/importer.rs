// SPDX-License-Identifier: Apache-2.0
//! The backup importer pipeline: pure per-packet transformations ending
//! in one transactional bulk upsert, so a bad row never contaminates the
//! store and the whole operation is idempotent on replay.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

use tracing::{debug, warn};
use xtoc_store::{KeyTable, PacketRecord, PacketStore};
use xtoc_wire::aead::{self, KeyMaterial};
use xtoc_wire::error::TemplateId;
use xtoc_wire::templates::common::Location;
use xtoc_wire::templates::zone;
use xtoc_wire::wrapper::{parse_wrapper, Mode, Wrapper};

use crate::backup::BackupDocument;
use crate::error::ImportError;
use crate::geo;
use crate::roster::RosterSink;

/// Outcome counts from one [`import_backup`] call, matching the six
/// scenario counters the importer is expected to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Member + squad records handed to the roster collaborator.
    pub roster_total: u32,
    /// Team key entries successfully imported.
    pub keys_imported: u32,
    /// Team key entries rejected (missing field or bad key material).
    pub keys_failed: u32,
    /// Packet entries the importer attempted to parse.
    pub packets_parsed: u32,
    /// Packet entries written to the store.
    pub packets_stored: u32,
    /// Packet entries skipped before reaching the store (unparseable
    /// wrapper text).
    pub packets_store_skipped: u32,
    /// Stored packets that ended up with no derivable location.
    pub packets_no_geo: u32,
    /// New map markers produced by this batch.
    pub markers_added: u32,
    /// Geo-bearing packets that resolved to a marker already added by an
    /// earlier entry in the same batch.
    pub markers_duplicate: u32,
    /// ZONE packets fully decoded (including SECURE decrypt) for
    /// geometry.
    pub zone_decoded: u32,
    /// ZONE packets that could not be decoded for geometry.
    pub zone_decode_failed: u32,
}

/// Import `doc` into `store`, using `keys` to decrypt SECURE ZONE
/// packets and handing roster records to `roster`. Every record written
/// is tagged with `source_tag` in its `sources` set. `cancel` is checked
/// once per packet; setting it stops the scan after the in-flight packet
/// and still performs one bulk upsert of whatever was gathered so far.
///
/// # Errors
///
/// Returns [`ImportError::HeaderMismatch`] if the document's `v`/`app`
/// fields are wrong, or [`ImportError::Store`] if the final bulk upsert
/// fails.
pub async fn import_backup(
    doc: &BackupDocument,
    store: &PacketStore,
    keys: &KeyTable,
    roster: &mut dyn RosterSink,
    source_tag: &str,
    cancel: &AtomicBool,
) -> Result<ImportSummary, ImportError> {
    doc.validate_header()?;

    let mut summary = ImportSummary::default();

    roster.upsert_members(&doc.members);
    roster.upsert_squads(&doc.squads);
    #[allow(clippy::cast_possible_truncation)]
    {
        summary.roster_total = (doc.members.len() + doc.squads.len()) as u32;
    }

    let imported_keys = import_team_keys(doc, keys, &mut summary).await;
    select_active_key_if_unset(doc, keys, &imported_keys).await;

    let now = now_ms();
    let mut seen_marker_keys: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(doc.packets.len());

    for entry in &doc.packets {
        if cancel.load(Ordering::Relaxed) {
            debug!("importer: cancellation observed, stopping before next packet");
            break;
        }
        summary.packets_parsed += 1;

        let Some(wrapper) = parse_wrapper(&entry.raw) else {
            summary.packets_store_skipped += 1;
            continue;
        };
        let primary_key = primary_key_for(&wrapper);
        let mut body = wrapper.payload_bytes().unwrap_or_default();
        let mut has_geo = false;
        let mut features = Vec::new();
        let mut decode_error = None;
        let mut record_summary = entry.summary.clone().unwrap_or_default();

        if wrapper.template_id == TemplateId::Zone {
            match decode_zone_plaintext(&wrapper, keys).await {
                Ok(plaintext) => match zone::decode(&plaintext) {
                    Ok(decoded) => {
                        summary.zone_decoded += 1;
                        has_geo = true;
                        features = geo::features_for_shape(&primary_key, &decoded.shape)
                            .into_iter()
                            .map(|f| f.geometry)
                            .collect();
                        if record_summary.is_empty() {
                            record_summary = zone_summary(&decoded);
                        }
                        body = plaintext;
                    }
                    Err(err) => {
                        summary.zone_decode_failed += 1;
                        decode_error = Some(err.to_string());
                    }
                },
                Err(reason) => {
                    summary.zone_decode_failed += 1;
                    decode_error = Some(reason);
                }
            }
        }

        if !has_geo {
            if let (Some(lat), Some(lon)) = (entry.lat, entry.lon) {
                has_geo = true;
                let loc = Location { lat, lon };
                features = vec![geo::point_feature(&primary_key, loc).geometry];
            }
        }

        if has_geo {
            if seen_marker_keys.insert(primary_key.clone()) {
                summary.markers_added += 1;
            } else {
                summary.markers_duplicate += 1;
            }
        } else {
            summary.packets_no_geo += 1;
        }

        let mut sources = BTreeSet::new();
        sources.insert(source_tag.to_owned());

        #[allow(clippy::cast_possible_truncation)]
        let template_id_byte = wrapper.template_id.as_u32() as u8;

        records.push(PacketRecord {
            id: primary_key,
            template_id: template_id_byte,
            mode: mode_char(wrapper.mode),
            received_at: entry.created_at.unwrap_or(now),
            stored_at: now,
            sources,
            has_geo,
            wrapper_text: wrapper.to_text(),
            body,
            packet_at: entry.created_at,
            summary: record_summary,
            decode_error,
            features,
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    {
        summary.packets_stored = records.len() as u32;
    }
    store.put_many(records).await?;

    debug!(?summary, "importer: backup import complete");
    Ok(summary)
}

async fn import_team_keys(
    doc: &BackupDocument,
    keys: &KeyTable,
    summary: &mut ImportSummary,
) -> Vec<(String, u32, KeyMaterial)> {
    let mut imported = Vec::new();
    for entry in &doc.team_keys {
        let (Some(team_id), Some(kid), Some(key_b64url)) =
            (&entry.team_id, entry.kid, &entry.key_b64url)
        else {
            summary.keys_failed += 1;
            continue;
        };
        let material = xtoc_wire::base64url::decode(key_b64url)
            .ok()
            .and_then(|bytes| KeyMaterial::new(&bytes).ok());
        match material {
            Some(material) => {
                keys.insert_team_key(kid, material.clone()).await;
                imported.push((team_id.clone(), kid, material));
                summary.keys_imported += 1;
            }
            None => {
                warn!(team_id = %team_id, kid, "importer: rejecting malformed team key");
                summary.keys_failed += 1;
            }
        }
    }
    imported
}

async fn select_active_key_if_unset(
    doc: &BackupDocument,
    keys: &KeyTable,
    imported: &[(String, u32, KeyMaterial)],
) {
    if keys.active().await.is_some() || imported.is_empty() {
        return;
    }
    let prefs = doc.local_storage.clone().unwrap_or_default();
    if let Some(chosen) = select_preferred(
        imported,
        prefs.preferred_team_id.as_deref(),
        prefs.preferred_kid,
    ) {
        let (kid, material) = chosen;
        keys.set_active(kid, material).await;
    }
}

fn select_preferred(
    imported: &[(String, u32, KeyMaterial)],
    preferred_team: Option<&str>,
    preferred_kid: Option<u32>,
) -> Option<(u32, KeyMaterial)> {
    if let (Some(team), Some(kid)) = (preferred_team, preferred_kid) {
        if let Some((_, k, material)) = imported
            .iter()
            .find(|(t, k, _)| t.as_str() == team && *k == kid)
        {
            return Some((*k, material.clone()));
        }
    }
    if let Some(team) = preferred_team {
        if let Some((_, k, material)) = imported
            .iter()
            .filter(|(t, _, _)| t.as_str() == team)
            .max_by_key(|(_, k, _)| *k)
        {
            return Some((*k, material.clone()));
        }
    }
    imported
        .iter()
        .max_by_key(|(_, k, _)| *k)
        .map(|(_, k, material)| (*k, material.clone()))
}

async fn decode_zone_plaintext(wrapper: &Wrapper, keys: &KeyTable) -> Result<Vec<u8>, String> {
    let raw = wrapper
        .payload_bytes()
        .map_err(|err| format!("invalid base64url payload: {err}"))?;
    match wrapper.mode {
        Mode::Clear => Ok(raw),
        Mode::Secure => {
            let kid = wrapper
                .kid
                .ok_or_else(|| "secure wrapper missing kid".to_owned())?;
            let key = keys
                .resolve(kid)
                .await
                .ok_or_else(|| format!("no key found for kid {kid}"))?;
            let aad = aead::build_aad(wrapper);
            aead::decrypt(&key, &aad, &raw).map_err(|err| err.to_string())
        }
    }
}

fn mode_char(mode: Mode) -> char {
    match mode {
        Mode::Clear => 'C',
        Mode::Secure => 'S',
    }
}

fn primary_key_for(wrapper: &Wrapper) -> String {
    let t = wrapper.template_id.as_u32();
    let m = mode_char(wrapper.mode);
    match wrapper.kid {
        Some(kid) => format!("X1:{t}:{m}:{}:{kid}", wrapper.id),
        None => format!("X1:{t}:{m}:{}", wrapper.id),
    }
}

fn zone_summary(decoded: &zone::Zone) -> String {
    decoded
        .label
        .clone()
        .unwrap_or_else(|| "ZONE".to_owned())
}

fn now_ms() -> u64 {
    #[allow(clippy::unwrap_used)]
    UNIX_EPOCH
        .elapsed()
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::roster::NullRosterSink;
    use xtoc_wire::templates::zone::{Shape, Zone};
    use xtoc_wire::templates::Template;
    use xtoc_wire::wrapper::build_wrapper;

    fn clear_wrapper_text(template: &Template, id: &str) -> String {
        let payload = template.encode().unwrap();
        build_wrapper(
            template.template_id(),
            Mode::Clear,
            id,
            1,
            1,
            None,
            &xtoc_wire::base64url::encode(&payload),
        )
    }

    fn sitrep_sample() -> Template {
        Template::Sitrep(xtoc_wire::templates::sitrep::Sitrep {
            src: 10,
            dst: 20,
            priority: 2,
            status: 1,
            t: 60_000,
            loc: None,
            note: None,
            src_ids: vec![],
        })
    }

    fn zone_circle_sample() -> Template {
        Template::Zone(Zone {
            src: 1,
            threat: 0,
            meaning_code: 0,
            t: 60_000,
            label: Some("AO NORTH".to_owned()),
            note: None,
            shape: Shape::Circle {
                center: Location { lat: 0.0, lon: 0.0 },
                radius_metres: 100,
            },
            src_ids: vec![],
        })
    }

    fn doc_with_packets(packets_json: &str) -> BackupDocument {
        let json = format!(
            r#"{{"v":1,"app":"xtoc","members":[],"squads":[],"teamKeys":[],"packets":[{packets_json}]}}"#
        );
        BackupDocument::parse(&json).unwrap()
    }

    #[tokio::test]
    async fn imports_zone_circle_sitrep_and_plain_contact() {
        let zone_text = clear_wrapper_text(&zone_circle_sample(), "AAAA0001");
        let sitrep_text = clear_wrapper_text(&sitrep_sample(), "AAAA0002");
        let contact_text = clear_wrapper_text(
            &Template::Contact(xtoc_wire::templates::contact::Contact {
                src: 1,
                priority: 1,
                t: 0,
                type_code: 0,
                count: 1,
                direction: 0,
                loc: None,
                note: None,
                src_ids: vec![],
            }),
            "AAAA0003",
        );

        let packets_json = format!(
            r#"{{"raw":"{zone_text}"}},{{"raw":"{sitrep_text}","lat":40.0,"lon":-75.0}},{{"raw":"{contact_text}"}}"#
        );
        let doc = doc_with_packets(&packets_json);

        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);

        let summary = import_backup(&doc, &store, &keys, &mut roster, "backup-1", &cancel)
            .await
            .unwrap();

        assert_eq!(summary.packets_parsed, 3);
        assert_eq!(summary.packets_stored, 3);
        assert_eq!(summary.packets_no_geo, 1);
        assert_eq!(summary.markers_added, 2);
        assert_eq!(summary.zone_decoded, 1);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn rejects_wrong_header() {
        let doc = BackupDocument::parse(
            r#"{"v":1,"app":"other","members":[],"squads":[],"teamKeys":[],"packets":[]}"#,
        )
        .unwrap();
        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);
        let result = import_backup(&doc, &store, &keys, &mut roster, "src", &cancel).await;
        assert!(matches!(result, Err(ImportError::HeaderMismatch { .. })));
    }

    #[tokio::test]
    async fn unparseable_wrapper_is_skipped_not_fatal() {
        let doc = doc_with_packets(r#"{"raw":"not-a-wrapper"}"#);
        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);
        let summary = import_backup(&doc, &store, &keys, &mut roster, "src", &cancel)
            .await
            .unwrap();
        assert_eq!(summary.packets_store_skipped, 1);
        assert_eq!(summary.packets_stored, 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_team_key_entry_is_rejected_without_failing_the_batch() {
        let json = r#"{"v":1,"app":"xtoc","members":[],"squads":[],
            "teamKeys":[{"teamId":"alpha","kid":5},{"teamId":"alpha","kid":6,"keyB64Url":"not-base64url!!"}],
            "packets":[]}"#;
        let doc = BackupDocument::parse(json).unwrap();
        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);
        let summary = import_backup(&doc, &store, &keys, &mut roster, "src", &cancel)
            .await
            .unwrap();
        assert_eq!(summary.keys_failed, 2);
        assert_eq!(summary.keys_imported, 0);
    }

    #[tokio::test]
    async fn selects_active_key_by_preference() {
        let key_bytes = [7u8; 32];
        let key_b64url = xtoc_wire::base64url::encode(&key_bytes);
        let json = format!(
            r#"{{"v":1,"app":"xtoc","members":[],"squads":[],
            "teamKeys":[{{"teamId":"alpha","kid":3,"keyB64Url":"{key_b64url}"}},
                        {{"teamId":"alpha","kid":9,"keyB64Url":"{key_b64url}"}}],
            "packets":[],
            "localStorage":{{"preferredTeamId":"alpha","preferredKid":3}}}}"#
        );
        let doc = BackupDocument::parse(&json).unwrap();
        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);
        import_backup(&doc, &store, &keys, &mut roster, "src", &cancel)
            .await
            .unwrap();
        let (active_kid, _) = keys.active().await.unwrap();
        assert_eq!(active_kid, 3);
    }

    #[tokio::test]
    async fn reimporting_same_packet_merges_sources_without_duplicate_marker() {
        let sitrep_text = clear_wrapper_text(&sitrep_sample(), "AAAA0002");
        let packets_json = format!(r#"{{"raw":"{sitrep_text}","lat":1.0,"lon":1.0}}"#);
        let doc = doc_with_packets(&packets_json);

        let store = PacketStore::open_temporary().unwrap();
        let keys = KeyTable::new();
        let mut roster = NullRosterSink;
        let cancel = AtomicBool::new(false);

        import_backup(&doc, &store, &keys, &mut roster, "first", &cancel)
            .await
            .unwrap();
        import_backup(&doc, &store, &keys, &mut roster, "second", &cancel)
            .await
            .unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let key = primary_key_for(&parse_wrapper(&sitrep_text).unwrap());
        let record = store.get(&key).unwrap().unwrap();
        assert_eq!(record.sources.len(), 2);
    }
}
