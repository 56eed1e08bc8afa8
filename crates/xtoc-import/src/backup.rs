// SPDX-License-Identifier: Apache-2.0
//! The XTOC backup document JSON shape.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ImportError;

const SUPPORTED_VERSION: u64 = 1;
const SUPPORTED_APP: &str = "xtoc";

/// One team key entry as it appears in a backup document.
///
/// `team_id`/`kid`/`key_b64url` are optional here even though a valid
/// entry always carries all three: the importer rejects incomplete
/// entries one at a time (see `xtoc_import::importer`), so a single bad
/// row in `teamKeys` can't fail the whole document's JSON parse.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupTeamKey {
    /// Team this key belongs to.
    #[serde(rename = "teamId")]
    pub team_id: Option<String>,
    /// Key id.
    pub kid: Option<u32>,
    /// 32-byte key material, base64url-encoded.
    #[serde(rename = "keyB64Url")]
    pub key_b64url: Option<String>,
    /// Creation time in unix milliseconds, if present.
    #[serde(rename = "createdAt")]
    pub created_at: Option<u64>,
}

/// One packet entry as it appears in a backup document.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupPacket {
    /// The wrapper's canonical textual form (`X1.*`).
    pub raw: String,
    /// When this packet was first observed, unix milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: Option<u64>,
    /// Latitude carried alongside the packet by the exporting app, used
    /// for templates the importer does not fully decode.
    pub lat: Option<f64>,
    /// Longitude, paired with `lat`.
    pub lon: Option<f64>,
    /// Human-readable summary carried alongside the packet, used when
    /// the importer cannot derive its own (decode failure, no geometry).
    pub summary: Option<String>,
}

/// The device's preferred `(teamId, kid)` pair, mirroring the exporting
/// app's localStorage preference. Parsed best-effort: an absent or
/// malformed `localStorage` object just yields `None` fields rather than
/// failing the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalStoragePrefs {
    /// Preferred team id, if the device had selected one.
    #[serde(rename = "preferredTeamId")]
    pub preferred_team_id: Option<String>,
    /// Preferred key id within the preferred team, if selected.
    #[serde(rename = "preferredKid")]
    pub preferred_kid: Option<u32>,
}

/// A full XTOC backup document.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupDocument {
    /// Document schema version; only `1` is accepted.
    pub v: u64,
    /// App tag; only `"xtoc"` is accepted.
    pub app: String,
    /// When the export was produced, unix milliseconds.
    #[serde(rename = "exportedAt")]
    pub exported_at: Option<u64>,
    /// Raw roster member records, handed to the roster collaborator
    /// untouched.
    #[serde(default)]
    pub members: Vec<Value>,
    /// Raw roster squad records, handed to the roster collaborator
    /// untouched.
    #[serde(default)]
    pub squads: Vec<Value>,
    /// Team keys to import.
    #[serde(rename = "teamKeys", default)]
    pub team_keys: Vec<BackupTeamKey>,
    /// Packets to import.
    #[serde(default)]
    pub packets: Vec<BackupPacket>,
    /// The exporting device's key preference, if it carried one.
    #[serde(rename = "localStorage", default)]
    pub local_storage: Option<LocalStoragePrefs>,
}

impl BackupDocument {
    /// Parse a backup document from JSON text and validate its header.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::HeaderMismatch`] if `v != 1` or
    /// `app != "xtoc"`. JSON parse failures surface as
    /// `serde_json::Error` wrapped by the caller (this function only
    /// validates the already-deserialized header).
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the document's header fields.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::HeaderMismatch`] if `v != 1` or
    /// `app != "xtoc"`.
    pub fn validate_header(&self) -> Result<(), ImportError> {
        if self.v != SUPPORTED_VERSION || self.app != SUPPORTED_APP {
            return Err(ImportError::HeaderMismatch {
                v: self.v,
                app: self.app.clone(),
            });
        }
        Ok(())
    }
}
