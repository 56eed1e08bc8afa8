// SPDX-License-Identifier: Apache-2.0
//! Wire grammar, binary template codecs, and AEAD layer for XTOC packets.
//!
//! An XTOC packet is a textual `X1.*` wrapper (see [`wrapper`]) carrying a
//! base64url payload. In `C`lear mode the payload is a template's plaintext
//! bytes; in `S`ecure mode the payload is an [`aead`]-sealed envelope that
//! decrypts to the same plaintext bytes. The plaintext bytes of every
//! template are decoded by [`templates`].
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::multiple_crate_versions
)]

pub mod aead;
pub mod base64url;
pub mod bytes;
pub mod error;
pub mod templates;
pub mod wrapper;

pub use error::{CodecError, TemplateId};
pub use wrapper::{Mode, Wrapper};
