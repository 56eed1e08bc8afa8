// SPDX-License-Identifier: Apache-2.0
//! Unpadded base64url codec used for every wrapper payload.

use base64::{alphabet, engine::general_purpose::NO_PAD, Engine};
use thiserror::Error;

const ENGINE: base64::engine::GeneralPurpose =
    base64::engine::GeneralPurpose::new(&alphabet::URL_SAFE, NO_PAD);

/// Errors from decoding a base64url string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base64Error {
    /// A byte in the input was outside the URL-safe base64 alphabet, or the
    /// input length could not represent whole bytes.
    #[error("invalid base64url encoding")]
    InvalidEncoding,
}

/// Encode `bytes` as unpadded, URL-safe base64.
pub fn encode(bytes: &[u8]) -> String {
    ENGINE.encode(bytes)
}

/// Decode an unpadded, URL-safe base64 string.
///
/// # Errors
///
/// Returns [`Base64Error::InvalidEncoding`] if `text` contains a byte
/// outside the URL-safe alphabet or an invalid trailing group.
pub fn decode(text: &str) -> Result<Vec<u8>, Base64Error> {
    ENGINE
        .decode(text)
        .map_err(|_| Base64Error::InvalidEncoding)
}
