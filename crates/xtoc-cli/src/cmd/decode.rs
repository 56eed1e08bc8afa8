// SPDX-License-Identifier: Apache-2.0
//! `xtoc-cli decode` — parse a wrapper's textual envelope, decrypt it if
//! SECURE and a key was supplied, and print its fields.

use anyhow::{anyhow, Context};
use comfy_table::Table;
use xtoc_wire::aead::{self, KeyMaterial};
use xtoc_wire::templates::Template;
use xtoc_wire::wrapper::{parse_wrapper, Mode};

/// Arguments for `xtoc-cli decode`.
#[derive(Debug, clap::Args)]
pub struct DecodeArgs {
    /// The wrapper's canonical textual form (`X1.*`).
    pub wrapper: String,
    /// Hex-encoded 32-byte key, required to decode a SECURE wrapper.
    #[arg(long)]
    pub key_hex: Option<String>,
}

/// Run `xtoc-cli decode`.
pub fn run(args: &DecodeArgs) -> anyhow::Result<()> {
    let wrapper =
        parse_wrapper(&args.wrapper).ok_or_else(|| anyhow!("not a recognized X1.* wrapper"))?;

    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["templateId".to_owned(), wrapper.template_id.to_string()]);
    table.add_row(vec![
        "mode".to_owned(),
        match wrapper.mode {
            Mode::Clear => "C".to_owned(),
            Mode::Secure => "S".to_owned(),
        },
    ]);
    table.add_row(vec!["id".to_owned(), wrapper.id.clone()]);
    table.add_row(vec!["part".to_owned(), wrapper.part.to_string()]);
    table.add_row(vec!["total".to_owned(), wrapper.total.to_string()]);
    if let Some(kid) = wrapper.kid {
        table.add_row(vec!["kid".to_owned(), kid.to_string()]);
    }

    let plaintext = match wrapper.mode {
        Mode::Clear => wrapper
            .payload_bytes()
            .context("decoding base64url payload")?,
        Mode::Secure => {
            let key_hex = args
                .key_hex
                .as_deref()
                .ok_or_else(|| anyhow!("--key-hex is required to decode a SECURE wrapper"))?;
            let key_bytes = hex::decode(key_hex).context("parsing --key-hex")?;
            let key = KeyMaterial::new(&key_bytes).context("building key material")?;
            let sealed = wrapper
                .payload_bytes()
                .context("decoding base64url payload")?;
            let aad = aead::build_aad(&wrapper);
            aead::decrypt(&key, &aad, &sealed).context("AEAD decrypt")?
        }
    };

    match Template::decode(wrapper.template_id, &plaintext) {
        Ok(decoded) => table.add_row(vec!["decoded".to_owned(), format!("{decoded:?}")]),
        Err(err) => table.add_row(vec!["decodeError".to_owned(), err.to_string()]),
    };

    println!("{table}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_wrapper_text() {
        let args = DecodeArgs {
            wrapper: "not a wrapper".to_owned(),
            key_hex: None,
        };
        assert!(run(&args).is_err());
    }

    #[test]
    fn decodes_clear_sitrep() {
        let sitrep = xtoc_wire::templates::sitrep::Sitrep {
            src: 1,
            dst: 2,
            priority: 0,
            status: 0,
            t: 0,
            loc: None,
            note: None,
            src_ids: vec![],
        };
        let payload = xtoc_wire::templates::sitrep::encode(&sitrep);
        let text = xtoc_wire::wrapper::build_wrapper(
            xtoc_wire::error::TemplateId::Sitrep,
            Mode::Clear,
            "AAAA0001",
            1,
            1,
            None,
            &xtoc_wire::base64url::encode(&payload),
        );
        let args = DecodeArgs {
            wrapper: text,
            key_hex: None,
        };
        assert!(run(&args).is_ok());
    }

    #[test]
    fn secure_wrapper_without_key_hex_fails() {
        let text = "X1.1.S.AAAA0001.1/1.5.cGF5bG9hZA".to_owned();
        let args = DecodeArgs {
            wrapper: text,
            key_hex: None,
        };
        assert!(run(&args).is_err());
    }
}
