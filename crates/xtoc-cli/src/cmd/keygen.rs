// SPDX-License-Identifier: Apache-2.0
//! `xtoc-cli keygen` — mint a fresh 32-byte AEAD key for seeding a team's
//! key bundle.

use rand::RngCore;

/// Arguments for `xtoc-cli keygen`.
#[derive(Debug, clap::Args)]
pub struct KeygenArgs {
    /// Key id to label the generated key with in the printed output.
    #[arg(long, default_value_t = 1)]
    pub kid: u32,
}

/// Run `xtoc-cli keygen`.
pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    println!("kid:        {}", args.kid);
    println!("key (hex):  {}", hex::encode(bytes));
    println!("key (b64u): {}", xtoc_wire::base64url::encode(&bytes));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generates_a_key_without_error() {
        let args = KeygenArgs { kid: 7 };
        assert!(run(&args).is_ok());
    }
}
