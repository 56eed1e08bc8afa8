// SPDX-License-Identifier: Apache-2.0
//! Sled-backed packet store with secondary indexes and an observer
//! channel, guarded by a single-writer lock.
//!
//! The primary `packets` tree is the source of truth; six secondary
//! index trees (`receivedAt`, `storedAt`, `templateId`, `mode`, `source`,
//! `hasGeo`) exist purely to make [`PacketStore::list`] avoid a full
//! table scan. The primary write is wrapped in a sled transaction;
//! index-tree maintenance happens immediately after under the store's
//! own write lock, which already serializes every mutating call, so a
//! crash between the two can only ever leave a stale index entry (never
//! a wrong one relative to the primary record) — acceptable for a local
//! embedded store with no concurrent external writers.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::record::{ListFilter, PacketRecord, StoreEvent};

const DEFAULT_EVENT_CAPACITY: usize = 256;
/// Hard cap on the number of records [`PacketStore::list`] will return in
/// one call, regardless of the requested limit.
pub const MAX_LIST_LIMIT: usize = 5000;

/// An embedded, transactional packet store.
pub struct PacketStore {
    db: sled::Db,
    packets: sled::Tree,
    idx_received_at: sled::Tree,
    idx_stored_at: sled::Tree,
    idx_template_id: sled::Tree,
    idx_mode: sled::Tree,
    idx_source: sled::Tree,
    idx_has_geo: sled::Tree,
    write_lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl PacketStore {
    /// Open (or create) a store rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sled`] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a purely in-memory store, useful for tests and short-lived
    /// sessions that don't need persistence across process restarts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sled`] if the database cannot be opened.
    pub fn open_temporary() -> Result<Arc<Self>, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Arc<Self>, StoreError> {
        let packets = db.open_tree("packets")?;
        let idx_received_at = db.open_tree("idx_received_at")?;
        let idx_stored_at = db.open_tree("idx_stored_at")?;
        let idx_template_id = db.open_tree("idx_template_id")?;
        let idx_mode = db.open_tree("idx_mode")?;
        let idx_source = db.open_tree("idx_source")?;
        let idx_has_geo = db.open_tree("idx_has_geo")?;
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Ok(Arc::new(Self {
            db,
            packets,
            idx_received_at,
            idx_stored_at,
            idx_template_id,
            idx_mode,
            idx_source,
            idx_has_geo,
            write_lock: Mutex::new(()),
            events,
        }))
    }

    /// Subscribe to store mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Insert or merge one record. If a record with the same `id` already
    /// exists, its `sources` are unioned into the incoming record (see
    /// [`PacketRecord::merge_from`]) rather than being overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database or serialization failure.
    pub async fn put(&self, record: PacketRecord) -> Result<(), StoreError> {
        self.put_many(vec![record]).await.map(|_| ())
    }

    /// Insert or merge many records in one locked batch, emitting a
    /// single [`StoreEvent::Put`] notification for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database or serialization failure.
    pub async fn put_many(&self, records: Vec<PacketRecord>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let mut written = 0usize;
        for incoming in records {
            self.put_one_locked(incoming)?;
            written += 1;
        }
        debug!(count = written, "store: put_many committed");
        let _ = self.events.send(StoreEvent::Put { count: written });
        Ok(written)
    }

    fn put_one_locked(&self, incoming: PacketRecord) -> Result<(), StoreError> {
        let key = incoming.id.clone().into_bytes();

        let existing = self
            .packets
            .get(&key)?
            .map(|raw| serde_json::from_slice::<PacketRecord>(&raw))
            .transpose()?;

        if let Some(old) = &existing {
            self.remove_index_entries(old);
        }

        let merged = match existing {
            Some(mut old) => {
                old.merge_from(&incoming);
                old
            }
            None => incoming,
        };

        let serialized = serde_json::to_vec(&merged)?;
        self.packets
            .transaction(|tx| {
                tx.insert(key.as_slice(), serialized.clone())?;
                Ok::<(), sled::transaction::ConflictableTransactionError<StoreError>>(())
            })
            .map_err(|e| StoreError::TransactionAborted(e.to_string()))?;

        self.insert_index_entries(&merged)?;
        Ok(())
    }

    fn insert_index_entries(&self, record: &PacketRecord) -> Result<(), StoreError> {
        let id = record.id.as_bytes();

        self.idx_received_at
            .insert(sortable_key(record.received_at, id), &[])?;
        self.idx_stored_at
            .insert(sortable_key(record.stored_at, id), &[])?;
        self.idx_template_id
            .insert(tagged_key(record.template_id, id), &[])?;
        self.idx_mode
            .insert(tagged_key(record.mode as u8, id), &[])?;
        self.idx_has_geo
            .insert(tagged_key(u8::from(record.has_geo), id), &[])?;
        for source in &record.sources {
            self.idx_source.insert(source_key(source, id), &[])?;
        }
        Ok(())
    }

    fn remove_index_entries(&self, record: &PacketRecord) {
        let id = record.id.as_bytes();
        let _ = self.idx_received_at.remove(sortable_key(record.received_at, id));
        let _ = self.idx_stored_at.remove(sortable_key(record.stored_at, id));
        let _ = self.idx_template_id.remove(tagged_key(record.template_id, id));
        let _ = self.idx_mode.remove(tagged_key(record.mode as u8, id));
        let _ = self.idx_has_geo.remove(tagged_key(u8::from(record.has_geo), id));
        for source in &record.sources {
            if let Err(err) = self.idx_source.remove(source_key(source, id)) {
                warn!(?err, "store: failed to remove stale source index entry");
            }
        }
    }

    /// Fetch one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database or deserialization failure.
    pub fn get(&self, id: &str) -> Result<Option<PacketRecord>, StoreError> {
        match self.packets.get(id.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Total number of distinct packet ids in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sled`] on database failure.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.packets.len())
    }

    /// List records newest-first by `received_at`, breaking ties by id,
    /// applying `filter`, and returning at most `min(limit,
    /// MAX_LIST_LIMIT)` records.
    ///
    /// Traversal walks the `receivedAt` index descending and stops as soon
    /// as either `filter.since_ms` or `limit` is exhausted, whichever
    /// comes first — a record older than `since_ms` ends the scan rather
    /// than merely being skipped, since every later entry in the index is
    /// older still.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on database or deserialization failure.
    pub fn list(&self, filter: &ListFilter, limit: usize) -> Result<Vec<PacketRecord>, StoreError> {
        let cap = limit.min(MAX_LIST_LIMIT);
        let mut out = Vec::with_capacity(cap.min(64));
        for entry in self.idx_received_at.iter().rev() {
            let (key, _) = entry?;
            let received_at = received_at_from_index_key(&key);
            if let Some(since_ms) = filter.since_ms {
                if received_at < since_ms {
                    break;
                }
            }
            let id_bytes = &key[8..];
            let id = String::from_utf8_lossy(id_bytes).into_owned();
            let Some(record) = self.get(&id)? else { continue };
            if matches_filter(&record, filter) {
                out.push(record);
                if out.len() >= cap {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Remove every record and index entry from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sled`] on database failure.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.packets.clear()?;
        self.idx_received_at.clear()?;
        self.idx_stored_at.clear()?;
        self.idx_template_id.clear()?;
        self.idx_mode.clear()?;
        self.idx_source.clear()?;
        self.idx_has_geo.clear()?;
        self.db.flush()?;
        let _ = self.events.send(StoreEvent::Cleared);
        Ok(())
    }
}

fn matches_filter(record: &PacketRecord, filter: &ListFilter) -> bool {
    if let Some(template_id) = filter.template_id {
        if record.template_id != template_id {
            return false;
        }
    }
    if let Some(mode) = filter.mode {
        if record.mode != mode {
            return false;
        }
    }
    if let Some(source) = &filter.source {
        if !record.sources.contains(source) {
            return false;
        }
    }
    if let Some(has_geo) = filter.has_geo {
        if record.has_geo != has_geo {
            return false;
        }
    }
    if let Some(query) = &filter.query {
        let haystack = format!("{} {}", record.summary, record.wrapper_text).to_lowercase();
        if !haystack.contains(&query.to_lowercase()) {
            return false;
        }
    }
    true
}

/// Recover the big-endian `received_at` prefix written by
/// [`sortable_key`] from a `receivedAt` index key.
fn received_at_from_index_key(key: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&key[..8]);
    u64::from_be_bytes(buf)
}

/// `value` big-endian, followed by `id` — sorts numerically ascending
/// with id as the lexicographic tiebreak, as sled trees are byte-sorted.
fn sortable_key(value: u64, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + id.len());
    key.extend_from_slice(&value.to_be_bytes());
    key.extend_from_slice(id);
    key
}

fn tagged_key(tag: u8, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + id.len());
    key.push(tag);
    key.extend_from_slice(id);
    key
}

fn source_key(source: &str, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(source.len() + 1 + id.len());
    key.extend_from_slice(source.as_bytes());
    key.push(0);
    key.extend_from_slice(id);
    key
}
