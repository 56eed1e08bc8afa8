// SPDX-License-Identifier: Apache-2.0
//! XTOC developer CLI: decode a wrapper from the command line, run a
//! backup import against an on-disk store, or mint a fresh AEAD key.
//!
//! Not part of the browser-hosted product — a manual-verification and
//! filesystem-boundary-test surface, the same role `warp-cli` plays for
//! its own core.
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
    clippy::dbg_macro
)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::multiple_crate_versions,
    // A developer CLI is expected to print to stdout/stderr.
    clippy::print_stdout,
    clippy::print_stderr
)]

mod cmd;

use clap::{Parser, Subcommand};

/// XTOC developer CLI.
#[derive(Debug, Parser)]
#[command(name = "xtoc-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a wrapper's textual envelope and print its fields.
    Decode(cmd::decode::DecodeArgs),
    /// Import a backup document into an on-disk packet store.
    Import(cmd::import::ImportArgs),
    /// Generate a fresh 32-byte AEAD key.
    Keygen(cmd::keygen::KeygenArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Decode(args) => cmd::decode::run(&args),
        Command::Import(args) => cmd::import::run(&args).await,
        Command::Keygen(args) => cmd::keygen::run(&args),
    }
}
