// SPDX-License-Identifier: Apache-2.0
//! Text-format parsers for the two out-of-band bundles a station can
//! import outside of a full backup: a key bundle (one team's keys) and a
//! roster bundle (members/squads). Both are `<prefix>.<base64 JSON>`,
//! using padded standard base64 — distinct from the unpadded, URL-safe
//! alphabet `xtoc_wire::base64url` uses for wrapper payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BundleError;

const KEY_BUNDLE_PREFIX: &str = "XTOC-KEY.";
const ROSTER_BUNDLE_PREFIX: &str = "XTOC-TEAM.";

/// One key entry inside a parsed [`KeyBundle`].
#[derive(Debug, Clone, Deserialize)]
pub struct KeyBundleEntry {
    /// Key id.
    pub kid: u32,
    /// 32-byte key material, base64url-encoded (decode with
    /// [`xtoc_wire::base64url::decode`]).
    #[serde(rename = "keyB64Url")]
    pub key_b64url: String,
    /// Creation time in unix milliseconds, if the bundle carries one.
    #[serde(rename = "createdAt")]
    pub created_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct KeyBundleJson {
    #[serde(rename = "teamId")]
    team_id: String,
    keys: Vec<KeyBundleEntry>,
}

/// A parsed `XTOC-KEY.*` bundle: one team's worth of keys.
#[derive(Debug, Clone)]
pub struct KeyBundle {
    /// Team these keys belong to.
    pub team_id: String,
    /// Keys carried by the bundle.
    pub keys: Vec<KeyBundleEntry>,
}

/// Parse a key-bundle text blob.
///
/// # Errors
///
/// Returns [`BundleError`] if the prefix is missing, the suffix is not
/// valid base64, the decoded bytes are not UTF-8, or the JSON is
/// malformed or missing `teamId`/`keys`.
pub fn parse_key_bundle(text: &str) -> Result<KeyBundle, BundleError> {
    let suffix = text
        .strip_prefix(KEY_BUNDLE_PREFIX)
        .ok_or(BundleError::MissingPrefix("XTOC-KEY."))?;
    let raw = STANDARD.decode(suffix)?;
    let json = String::from_utf8(raw).map_err(|_| BundleError::InvalidUtf8)?;
    let parsed: KeyBundleJson = serde_json::from_str(&json)?;
    Ok(KeyBundle {
        team_id: parsed.team_id,
        keys: parsed.keys,
    })
}

#[derive(Debug, Deserialize)]
struct RosterBundleJson {
    v: u64,
    members: Vec<Value>,
    #[serde(default)]
    squads: Vec<Value>,
}

/// A parsed `XTOC-TEAM.*` bundle: a roster snapshot.
///
/// `members`/`squads` stay as raw JSON values — the roster's own shape is
/// owned by the external collaborator this importer hands them to (see
/// [`crate::roster::RosterSink`]).
#[derive(Debug, Clone)]
pub struct RosterBundle {
    /// Roster members.
    pub members: Vec<Value>,
    /// Roster squads, if the bundle carried any.
    pub squads: Vec<Value>,
}

/// Parse a roster-bundle text blob.
///
/// # Errors
///
/// Returns [`BundleError`] if the prefix is missing, the suffix is not
/// valid base64, the decoded bytes are not UTF-8, the JSON is malformed,
/// or `v != 1`.
pub fn parse_roster_bundle(text: &str) -> Result<RosterBundle, BundleError> {
    let suffix = text
        .strip_prefix(ROSTER_BUNDLE_PREFIX)
        .ok_or(BundleError::MissingPrefix("XTOC-TEAM."))?;
    let raw = STANDARD.decode(suffix)?;
    let json = String::from_utf8(raw).map_err(|_| BundleError::InvalidUtf8)?;
    let parsed: RosterBundleJson = serde_json::from_str(&json)?;
    if parsed.v != 1 {
        return Err(BundleError::UnsupportedVersion { seen: parsed.v });
    }
    Ok(RosterBundle {
        members: parsed.members,
        squads: parsed.squads,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn b64(json: &str) -> String {
        STANDARD.encode(json.as_bytes())
    }

    #[test]
    fn parses_key_bundle() {
        let json = r#"{"teamId":"alpha","keys":[{"kid":5,"keyB64Url":"abc","createdAt":1000}]}"#;
        let text = format!("XTOC-KEY.{}", b64(json));
        let bundle = parse_key_bundle(&text).unwrap();
        assert_eq!(bundle.team_id, "alpha");
        assert_eq!(bundle.keys.len(), 1);
        assert_eq!(bundle.keys[0].kid, 5);
    }

    #[test]
    fn rejects_missing_key_prefix() {
        assert!(matches!(
            parse_key_bundle("not-a-bundle"),
            Err(BundleError::MissingPrefix(_))
        ));
    }

    #[test]
    fn parses_roster_bundle() {
        let json = r#"{"v":1,"members":[{"id":"m1"}],"squads":[{"id":"s1"}]}"#;
        let text = format!("XTOC-TEAM.{}", b64(json));
        let bundle = parse_roster_bundle(&text).unwrap();
        assert_eq!(bundle.members.len(), 1);
        assert_eq!(bundle.squads.len(), 1);
    }

    #[test]
    fn roster_bundle_squads_default_to_empty() {
        let json = r#"{"v":1,"members":[]}"#;
        let text = format!("XTOC-TEAM.{}", b64(json));
        let bundle = parse_roster_bundle(&text).unwrap();
        assert!(bundle.squads.is_empty());
    }

    #[test]
    fn rejects_unsupported_roster_version() {
        let json = r#"{"v":2,"members":[]}"#;
        let text = format!("XTOC-TEAM.{}", b64(json));
        assert!(matches!(
            parse_roster_bundle(&text),
            Err(BundleError::UnsupportedVersion { seen: 2 })
        ));
    }
}
