// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the packet store and key table.

use thiserror::Error;

/// Failures raised by [`crate::store::PacketStore`] and
/// [`crate::keys::KeyTable`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying embedded database reported an error.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    /// A stored record could not be deserialized back to a
    /// [`crate::record::PacketRecord`] (or vice versa).
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A transactional write aborted without a database-level cause.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
}
