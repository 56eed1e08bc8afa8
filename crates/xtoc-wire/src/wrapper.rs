// SPDX-License-Identifier: Apache-2.0
//! The `X1.*` textual envelope shared by every XTOC packet.
//!
//! ```text
//! CLEAR:  X1.<T>.C.<ID>.<P>/<N>.<PAYLOAD>
//! SECURE: X1.<T>.S.<ID>.<P>/<N>.<KID>.<PAYLOAD>
//! ```

use rand::Rng;

use crate::error::TemplateId;

/// Packet identifier alphabet: Crockford-style, excludes `I`, `L`, `O`, `U`
/// to avoid visual ambiguity in hand-transcribed callsign/ID exchanges.
pub const PACKET_ID_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Transport mode of a wrapper's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plaintext template bytes, base64url-encoded directly.
    Clear,
    /// AEAD-sealed template bytes; `kid` names the key.
    Secure,
}

impl Mode {
    const fn as_char(self) -> char {
        match self {
            Self::Clear => 'C',
            Self::Secure => 'S',
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::Clear),
            'S' => Some(Self::Secure),
            _ => None,
        }
    }
}

/// A parsed `X1.*` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    /// Template this packet's payload decodes as.
    pub template_id: TemplateId,
    /// CLEAR or SECURE.
    pub mode: Mode,
    /// Short opaque packet identifier (unique per sender, not globally).
    pub id: String,
    /// 1-based part number of a possibly multi-part packet.
    pub part: u32,
    /// Total number of parts.
    pub total: u32,
    /// Key id, present iff `mode == Secure`.
    pub kid: Option<u32>,
    /// Base64url-encoded payload (template plaintext, or AEAD envelope).
    pub payload: String,
}

impl Wrapper {
    /// Decode the wrapper's base64url payload to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::base64url::Base64Error`] if `payload` is not valid
    /// unpadded base64url.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, crate::base64url::Base64Error> {
        crate::base64url::decode(&self.payload)
    }
}

/// Parse an `X1.*` wrapper from its textual form.
///
/// Returns `None` — not an error type — on any shape violation: wrong
/// version tag, too few segments, non-numeric templateId/part/total/kid,
/// an unrecognized mode letter, or an unknown templateId. A malformed
/// wrapper is an expected outcome of untrusted transport input, not an
/// exceptional condition.
///
/// The payload is reassembled from everything after the fixed prefix
/// (5 dots for CLEAR, 6 for SECURE) because a base64url payload cannot
/// itself contain `.`, but future payload encodings might; splitting only
/// on the first N delimiters keeps this function forward-compatible with
/// payloads that do.
pub fn parse_wrapper(text: &str) -> Option<Wrapper> {
    let mut parts = text.splitn(4, '.');
    if parts.next()? != "X1" {
        return None;
    }
    let template_id_raw: u32 = parts.next()?.parse().ok()?;
    let mode_tag = parts.next()?;
    let mode = Mode::from_char(mode_tag.chars().next()?)?;
    if mode_tag.len() != 1 {
        return None;
    }
    let rest = parts.next()?;

    let template_id = TemplateId::from_u32(template_id_raw)?;

    match mode {
        Mode::Clear => {
            // rest = "<ID>.<P>/<N>.<PAYLOAD>"
            let mut rest_parts = rest.splitn(3, '.');
            let id = rest_parts.next()?.to_owned();
            let (part, total) = parse_part_total(rest_parts.next()?)?;
            let payload = rest_parts.next()?.to_owned();
            if id.is_empty() || payload.is_empty() {
                return None;
            }
            Some(Wrapper {
                template_id,
                mode,
                id,
                part,
                total,
                kid: None,
                payload,
            })
        }
        Mode::Secure => {
            // rest = "<ID>.<P>/<N>.<KID>.<PAYLOAD>"
            let mut rest_parts = rest.splitn(4, '.');
            let id = rest_parts.next()?.to_owned();
            let (part, total) = parse_part_total(rest_parts.next()?)?;
            let kid: u32 = rest_parts.next()?.parse().ok()?;
            let payload = rest_parts.next()?.to_owned();
            if id.is_empty() || payload.is_empty() || kid == 0 {
                return None;
            }
            Some(Wrapper {
                template_id,
                mode,
                id,
                part,
                total,
                kid: Some(kid),
                payload,
            })
        }
    }
}

fn parse_part_total(s: &str) -> Option<(u32, u32)> {
    let (p, n) = s.split_once('/')?;
    let part: u32 = p.parse().ok()?;
    let total: u32 = n.parse().ok()?;
    if part < 1 || total < part {
        return None;
    }
    Some((part, total))
}

/// Reconstruct the canonical textual form of a wrapper.
pub fn build_wrapper(
    template_id: TemplateId,
    mode: Mode,
    id: &str,
    part: u32,
    total: u32,
    kid: Option<u32>,
    payload: &str,
) -> String {
    match mode {
        Mode::Clear => format!(
            "X1.{}.{}.{id}.{part}/{total}.{payload}",
            template_id.as_u32(),
            mode.as_char(),
        ),
        Mode::Secure => {
            let kid = kid.unwrap_or(0);
            format!(
                "X1.{}.{}.{id}.{part}/{total}.{kid}.{payload}",
                template_id.as_u32(),
                mode.as_char(),
            )
        }
    }
}

impl Wrapper {
    /// Reconstruct this wrapper's canonical textual form.
    pub fn to_text(&self) -> String {
        build_wrapper(
            self.template_id,
            self.mode,
            &self.id,
            self.part,
            self.total,
            self.kid,
            &self.payload,
        )
    }
}

/// Sample a cryptographically random packet id of `len` characters from
/// [`PACKET_ID_ALPHABET`].
pub fn generate_packet_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..PACKET_ID_ALPHABET.len());
            PACKET_ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Sample an 8-character packet id, the default length used by senders.
pub fn generate_default_packet_id() -> String {
    generate_packet_id(8)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_clear_wrapper() {
        let w = parse_wrapper("X1.1.C.ABCD1234.1/1.cGF5bG9hZA").unwrap();
        assert_eq!(w.template_id, TemplateId::Sitrep);
        assert_eq!(w.mode, Mode::Clear);
        assert_eq!(w.id, "ABCD1234");
        assert_eq!(w.part, 1);
        assert_eq!(w.total, 1);
        assert_eq!(w.kid, None);
        assert_eq!(w.payload, "cGF5bG9hZA");
    }

    #[test]
    fn parses_secure_wrapper() {
        let w = parse_wrapper("X1.1.S.ABCD1234.1/1.5.cGF5bG9hZA").unwrap();
        assert_eq!(w.mode, Mode::Secure);
        assert_eq!(w.kid, Some(5));
    }

    #[test]
    fn payload_may_contain_dots() {
        let w = parse_wrapper("X1.1.C.ABCD1234.1/1.a.b.c").unwrap();
        assert_eq!(w.payload, "a.b.c");
    }

    #[test]
    fn round_trips_through_build() {
        let original = "X1.7.S.ZZTOP9999.2/3.42.cGF5bG9hZA";
        let w1 = parse_wrapper(original).unwrap();
        let rebuilt = w1.to_text();
        let w2 = parse_wrapper(&rebuilt).unwrap();
        assert_eq!(w1, w2);
    }

    #[test]
    fn rejects_wrong_version_tag() {
        assert!(parse_wrapper("X2.1.C.ABCD.1/1.cGF5").is_none());
    }

    #[test]
    fn rejects_unknown_template() {
        assert!(parse_wrapper("X1.99.C.ABCD.1/1.cGF5").is_none());
    }

    #[test]
    fn rejects_non_numeric_counts() {
        assert!(parse_wrapper("X1.1.C.ABCD.x/1.cGF5").is_none());
    }

    #[test]
    fn rejects_total_less_than_part() {
        assert!(parse_wrapper("X1.1.C.ABCD.3/1.cGF5").is_none());
    }

    #[test]
    fn rejects_part_zero() {
        assert!(parse_wrapper("X1.1.C.ABCD.0/1.cGF5").is_none());
    }

    #[test]
    fn rejects_secure_with_kid_zero() {
        assert!(parse_wrapper("X1.1.S.ABCD.1/1.0.cGF5").is_none());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(parse_wrapper("X1.1.X.ABCD.1/1.cGF5").is_none());
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(parse_wrapper("X1.1.C.ABCD.1/1.").is_none());
    }

    #[test]
    fn generated_packet_id_uses_alphabet_only() {
        let id = generate_packet_id(16);
        assert_eq!(id.len(), 16);
        assert!(id.bytes().all(|b| PACKET_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn default_packet_id_is_eight_chars() {
        assert_eq!(generate_default_packet_id().len(), 8);
    }
}
