// SPDX-License-Identifier: Apache-2.0
//! The stored shape of one packet, and the events the store broadcasts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A decoded packet as it sits in the store.
///
/// `body` is the template's plaintext bytes: for a CLEAR packet this is
/// the wrapper's payload as-is; for a SECURE packet this is the result of
/// AEAD decryption, stored once so repeated reads don't re-derive it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PacketRecord {
    /// The wrapper's packet id (`<ID>` in `X1.*`), unique per sender.
    pub id: String,
    /// Numeric template id (see `xtoc_wire::TemplateId`).
    pub template_id: u8,
    /// `'C'` or `'S'`, mirroring [`xtoc_wire::Mode`].
    pub mode: char,
    /// Unix milliseconds this packet was first received by any source.
    pub received_at: u64,
    /// Unix milliseconds this record was last written to the store.
    pub stored_at: u64,
    /// Every source (radio channel, import file, peer id) this packet
    /// has been observed from, unioned across merges.
    pub sources: BTreeSet<String>,
    /// Whether the decoded template carries a location.
    pub has_geo: bool,
    /// The wrapper's canonical textual form, kept for re-export/debugging.
    pub wrapper_text: String,
    /// Decoded template plaintext bytes.
    pub body: Vec<u8>,
    /// Unix milliseconds the decoded content itself claims to be from
    /// (e.g. a template's own timestamp field), distinct from `received_at`.
    pub packet_at: Option<u64>,
    /// Human-readable one-line summary of the decoded content, for
    /// browse/search surfaces.
    pub summary: String,
    /// Decode failure, if the template or AEAD layer could not produce a
    /// plaintext object. A record with `decode_error` set still has a
    /// `body` (raw or sealed bytes) but no reliable `summary`/`features`.
    pub decode_error: Option<String>,
    /// GeoJSON-shaped point/polygon features derived from the decoded
    /// content, for map overlays. Empty when `has_geo` is false.
    pub features: Vec<serde_json::Value>,
}

impl PacketRecord {
    /// Merge `incoming` into `self` in place: union `sources`, keep the
    /// earliest `received_at`, advance `stored_at`, and take `incoming`'s
    /// decoded content as the latest-known state for this id.
    pub fn merge_from(&mut self, incoming: &Self) {
        self.sources.extend(incoming.sources.iter().cloned());
        self.received_at = self.received_at.min(incoming.received_at);
        self.stored_at = self.stored_at.max(incoming.stored_at);
        self.body.clone_from(&incoming.body);
        self.wrapper_text.clone_from(&incoming.wrapper_text);
        self.has_geo = incoming.has_geo;
        self.packet_at = incoming.packet_at;
        self.summary.clone_from(&incoming.summary);
        self.decode_error.clone_from(&incoming.decode_error);
        self.features.clone_from(&incoming.features);
    }
}

/// A mutation the store has just committed, broadcast to observers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// One or more records were inserted or merged.
    Put {
        /// Number of records affected by this write.
        count: usize,
    },
    /// The entire store was cleared.
    Cleared,
}

/// Filters accepted by [`crate::store::PacketStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Restrict to this template id, if set.
    pub template_id: Option<u8>,
    /// Restrict to this mode, if set.
    pub mode: Option<char>,
    /// Restrict to records observed from this source, if set.
    pub source: Option<String>,
    /// Restrict to records carrying (or not carrying) a location.
    pub has_geo: Option<bool>,
    /// Only consider records received at or after this time; traversal
    /// stops as soon as the descending `received_at` index falls below
    /// this window, same as hitting `limit`.
    pub since_ms: Option<u64>,
    /// Case-insensitive substring match against `summary` concatenated
    /// with `wrapper_text`, if set.
    pub query: Option<String>,
}
