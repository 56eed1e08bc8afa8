// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for bundle parsing and the backup importer.

use thiserror::Error;

/// Failures parsing a key-bundle (`XTOC-KEY.*`) or roster-bundle
/// (`XTOC-TEAM.*`) text blob.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The text did not start with the expected `XTOC-KEY.`/`XTOC-TEAM.`
    /// prefix.
    #[error("missing `{0}` prefix")]
    MissingPrefix(&'static str),
    /// The suffix after the prefix was not valid standard base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    /// The decoded bytes were not valid UTF-8.
    #[error("bundle payload is not valid UTF-8")]
    InvalidUtf8,
    /// The decoded text was not valid JSON, or was missing a required
    /// field.
    #[error("invalid bundle JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The bundle's `v` field was not the one version this importer
    /// understands.
    #[error("unsupported bundle version {seen}")]
    UnsupportedVersion {
        /// Version actually found.
        seen: u64,
    },
}

/// Failures raised while importing a backup document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The document's `v`/`app` header did not match what this importer
    /// accepts.
    #[error("backup document header mismatch: v={v}, app={app:?}")]
    HeaderMismatch {
        /// Version the document declared.
        v: u64,
        /// App tag the document declared.
        app: String,
    },
    /// The underlying packet store reported a failure.
    #[error("store failure: {0}")]
    Store(#[from] xtoc_store::StoreError),
}
