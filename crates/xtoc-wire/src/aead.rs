// SPDX-License-Identifier: Apache-2.0
//! Authenticated encryption for SECURE packets.
//!
//! A SECURE payload is `ver u8 ‖ nonce ‖ ciphertext‖tag`:
//! - `ver = 1`: XChaCha20-Poly1305, 24-byte nonce.
//! - `ver = 2`: ChaCha20-Poly1305, 12-byte nonce.
//!
//! The additional authenticated data is the UTF-8 bytes of
//! `"X1|<templateId>|<mode>|<id>|<part>|<total>|<kid>"` — the wrapper's own
//! framing fields, so a ciphertext cannot be replayed under a different
//! envelope without failing authentication.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, XChaCha20Poly1305};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::wrapper::{Mode, Wrapper};

/// Length in bytes of a valid AEAD key.
pub const KEY_LEN: usize = 32;

/// 32-byte symmetric key, zeroized on drop.
#[derive(Clone)]
pub struct KeyMaterial(Zeroizing<[u8; KEY_LEN]>);

impl KeyMaterial {
    /// Wrap raw key bytes. Rejects any length other than
    /// [`KEY_LEN`](KEY_LEN).
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::InvalidKeyLength`] if `bytes.len() != 32`.
    pub fn new(bytes: &[u8]) -> Result<Self, AeadError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| AeadError::InvalidKeyLength { seen: bytes.len() })?;
        Ok(Self(Zeroizing::new(arr)))
    }

    /// View the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}

/// AEAD payload version (the leading byte of a SECURE payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SecureVersion {
    /// XChaCha20-Poly1305, 24-byte nonce.
    V1 = 1,
    /// ChaCha20-Poly1305, 12-byte nonce.
    V2 = 2,
}

impl SecureVersion {
    const fn nonce_len(self) -> usize {
        match self {
            Self::V1 => 24,
            Self::V2 => 12,
        }
    }

    const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// AEAD layer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AeadError {
    /// Key material was not exactly 32 bytes.
    #[error("invalid key length: expected 32 bytes, got {seen}")]
    InvalidKeyLength {
        /// Length actually supplied.
        seen: usize,
    },
    /// The payload's leading byte names an unknown AEAD version.
    #[error("unsupported secure payload version {seen}")]
    UnsupportedSecureVersion {
        /// Version byte actually found.
        seen: u8,
    },
    /// The payload was too short to contain its declared nonce.
    #[error("secure payload truncated before nonce/ciphertext")]
    Truncated,
    /// Tag verification failed: wrong key, wrong AAD, or corrupted bytes.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// No key in scope (active slot or team-keys table) matches this kid.
    #[error("no key found for kid {kid}")]
    NoKeyForKid {
        /// The wrapper's key id.
        kid: u32,
    },
}

/// Build the AAD string bound into every AEAD operation for `wrapper`.
///
/// `"X1|<templateId>|<mode>|<id>|<part>|<total>|<kid>"`, UTF-8 encoded.
/// `kid` renders as `0` for CLEAR wrappers (which never call this — AAD is
/// only meaningful for SECURE payloads — but the helper stays total over
/// `Wrapper` so callers building a wrapper from scratch don't need a
/// separate signature).
pub fn build_aad(wrapper: &Wrapper) -> Vec<u8> {
    build_aad_parts(
        wrapper.template_id.as_u32(),
        wrapper.mode,
        &wrapper.id,
        wrapper.part,
        wrapper.total,
        wrapper.kid.unwrap_or(0),
    )
}

/// Build the AAD string from its constituent framing fields.
pub fn build_aad_parts(
    template_id: u32,
    mode: Mode,
    id: &str,
    part: u32,
    total: u32,
    kid: u32,
) -> Vec<u8> {
    let mode_char = match mode {
        Mode::Clear => 'C',
        Mode::Secure => 'S',
    };
    format!("X1|{template_id}|{mode_char}|{id}|{part}|{total}|{kid}").into_bytes()
}

/// Seal `plaintext` under `key` and `aad`, producing a SECURE payload's raw
/// bytes (before base64url encoding).
///
/// Always produces a `version` payload; the nonce is drawn fresh from the
/// OS CSPRNG on every call and is never cached or reused.
pub fn encrypt(
    version: SecureVersion,
    key: &KeyMaterial,
    aad: &[u8],
    plaintext: &[u8],
) -> Vec<u8> {
    let key_bytes = Key::from_slice(key.as_bytes());
    let mut out = Vec::with_capacity(1 + version.nonce_len() + plaintext.len() + 16);
    out.push(version as u8);
    match version {
        SecureVersion::V1 => {
            let cipher = XChaCha20Poly1305::new(key_bytes);
            let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
            // Constructing the cipher/nonce above cannot fail; encryption
            // with a validly-sized key only fails on plaintext length
            // overflow, which never occurs for in-memory packet payloads.
            #[allow(clippy::expect_used)]
            let ciphertext = cipher
                .encrypt(
                    &nonce,
                    chacha20poly1305::aead::Payload { msg: plaintext, aad },
                )
                .expect("chacha20poly1305 encryption of a bounded in-memory payload cannot fail");
            out.extend_from_slice(&nonce);
            out.extend_from_slice(&ciphertext);
        }
        SecureVersion::V2 => {
            let cipher = ChaCha20Poly1305::new(key_bytes);
            let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
            #[allow(clippy::expect_used)]
            let ciphertext = cipher
                .encrypt(
                    &nonce,
                    chacha20poly1305::aead::Payload { msg: plaintext, aad },
                )
                .expect("chacha20poly1305 encryption of a bounded in-memory payload cannot fail");
            out.extend_from_slice(&nonce);
            out.extend_from_slice(&ciphertext);
        }
    }
    out
}

/// Open a SECURE payload's raw bytes (after base64url decoding) under
/// `key` and `aad`, returning the template plaintext bytes.
///
/// # Errors
///
/// Returns [`AeadError::UnsupportedSecureVersion`] on an unknown leading
/// byte, [`AeadError::Truncated`] if the buffer is shorter than its
/// declared nonce, and [`AeadError::AuthenticationFailed`] on tag mismatch
/// (wrong key, wrong AAD, or corrupted ciphertext).
pub fn decrypt(key: &KeyMaterial, aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, AeadError> {
    let (&ver_byte, rest) = sealed
        .split_first()
        .ok_or(AeadError::UnsupportedSecureVersion { seen: 0 })?;
    let version =
        SecureVersion::from_u8(ver_byte).ok_or(AeadError::UnsupportedSecureVersion { seen: ver_byte })?;
    let nonce_len = version.nonce_len();
    if rest.len() < nonce_len {
        return Err(AeadError::Truncated);
    }
    let (nonce_bytes, ciphertext) = rest.split_at(nonce_len);
    let key_bytes = Key::from_slice(key.as_bytes());
    let payload = chacha20poly1305::aead::Payload { msg: ciphertext, aad };
    match version {
        SecureVersion::V1 => {
            let cipher = XChaCha20Poly1305::new(key_bytes);
            let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);
            cipher
                .decrypt(nonce, payload)
                .map_err(|_| AeadError::AuthenticationFailed)
        }
        SecureVersion::V2 => {
            let cipher = ChaCha20Poly1305::new(key_bytes);
            let nonce = chacha20poly1305::Nonce::from_slice(nonce_bytes);
            cipher
                .decrypt(nonce, payload)
                .map_err(|_| AeadError::AuthenticationFailed)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TemplateId;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::new(&[byte; 32]).unwrap()
    }

    fn sample_wrapper() -> Wrapper {
        Wrapper {
            template_id: TemplateId::Sitrep,
            mode: Mode::Secure,
            id: "ABCD1234".to_owned(),
            part: 1,
            total: 1,
            kid: Some(5),
            payload: String::new(),
        }
    }

    #[test]
    fn aad_matches_documented_format() {
        let aad = build_aad(&sample_wrapper());
        assert_eq!(aad, b"X1|1|S|ABCD1234|1|1|5");
    }

    #[test]
    fn v1_round_trips() {
        let k = key(0x42);
        let aad = b"some aad";
        let plaintext = b"hello xtoc";
        let sealed = encrypt(SecureVersion::V1, &k, aad, plaintext);
        assert_eq!(sealed[0], 1);
        let opened = decrypt(&k, aad, &sealed).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn v2_round_trips() {
        let k = key(0x99);
        let aad = b"other aad";
        let plaintext = b"sitrep payload bytes";
        let sealed = encrypt(SecureVersion::V2, &k, aad, plaintext);
        assert_eq!(sealed[0], 2);
        let opened = decrypt(&k, aad, &sealed).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn wrong_key_fails_auth() {
        let k1 = key(1);
        let k2 = key(2);
        let aad = b"aad";
        let sealed = encrypt(SecureVersion::V1, &k1, aad, b"secret");
        assert_eq!(decrypt(&k2, aad, &sealed), Err(AeadError::AuthenticationFailed));
    }

    #[test]
    fn wrong_aad_fails_auth() {
        let k = key(7);
        let sealed = encrypt(SecureVersion::V1, &k, b"aad-a", b"secret");
        assert_eq!(
            decrypt(&k, b"aad-b", &sealed),
            Err(AeadError::AuthenticationFailed)
        );
    }

    #[test]
    fn corrupted_last_byte_fails_auth() {
        let k = key(3);
        let aad = b"aad";
        let mut sealed = encrypt(SecureVersion::V1, &k, aad, b"secret");
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert_eq!(decrypt(&k, aad, &sealed), Err(AeadError::AuthenticationFailed));
    }

    #[test]
    fn unknown_version_byte_rejected() {
        let k = key(3);
        assert_eq!(
            decrypt(&k, b"aad", &[9, 1, 2, 3]),
            Err(AeadError::UnsupportedSecureVersion { seen: 9 })
        );
    }

    #[test]
    fn rejects_bad_key_length() {
        assert_eq!(
            KeyMaterial::new(&[0u8; 16]).unwrap_err(),
            AeadError::InvalidKeyLength { seen: 16 }
        );
    }

    #[test]
    fn nonces_are_not_reused_across_calls() {
        let k = key(5);
        let aad = b"aad";
        let a = encrypt(SecureVersion::V1, &k, aad, b"same plaintext");
        let b = encrypt(SecureVersion::V1, &k, aad, b"same plaintext");
        assert_ne!(a, b, "fresh nonce must change ciphertext bytes");
    }
}
