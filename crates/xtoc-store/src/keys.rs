// SPDX-License-Identifier: Apache-2.0
//! Active-key slot and team-keys table.
//!
//! A station has at most one active key (used to seal outgoing SECURE
//! packets) and a table of team keys by id (used to open incoming SECURE
//! packets from any kid the station has imported). Both are guarded by a
//! single-writer [`tokio::sync::Mutex`], mirroring the hub-state guard
//! pattern used for connection/session state elsewhere in this stack.

use std::collections::HashMap;

use tokio::sync::Mutex;
use xtoc_wire::aead::KeyMaterial;

/// Holds the active signing/sealing key and the table of known team keys.
#[derive(Default)]
pub struct KeyTable {
    active: Mutex<Option<(u32, KeyMaterial)>>,
    team_keys: Mutex<HashMap<u32, KeyMaterial>>,
}

impl KeyTable {
    /// Create an empty key table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active key slot, replacing whatever was there.
    pub async fn set_active(&self, kid: u32, key: KeyMaterial) {
        *self.active.lock().await = Some((kid, key));
    }

    /// Clear the active key slot.
    pub async fn clear_active(&self) {
        *self.active.lock().await = None;
    }

    /// The active `(kid, key)` pair, if one is set.
    pub async fn active(&self) -> Option<(u32, KeyMaterial)> {
        self.active.lock().await.clone()
    }

    /// Insert or replace a team key by id.
    pub async fn insert_team_key(&self, kid: u32, key: KeyMaterial) {
        self.team_keys.lock().await.insert(kid, key);
    }

    /// Number of team keys currently known (excludes the active slot
    /// unless it was also inserted as a team key).
    pub async fn team_key_count(&self) -> usize {
        self.team_keys.lock().await.len()
    }

    /// Resolve `kid` to a key: checks the active slot first, then the
    /// team-keys table.
    pub async fn resolve(&self, kid: u32) -> Option<KeyMaterial> {
        if let Some((active_kid, key)) = self.active.lock().await.clone() {
            if active_kid == kid {
                return Some(key);
            }
        }
        self.team_keys.lock().await.get(&kid).cloned()
    }
}
