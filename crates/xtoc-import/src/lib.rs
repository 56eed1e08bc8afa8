// SPDX-License-Identifier: Apache-2.0
//! Backup import pipeline, key/roster bundle text formats, and the
//! geodesy helper that turns a decoded ZONE shape into GeoJSON-shaped
//! features.
#![forbid(unsafe_code)]
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
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::multiple_crate_versions
)]

pub mod backup;
pub mod bundle;
pub mod error;
pub mod geo;
pub mod importer;
pub mod roster;

pub use backup::BackupDocument;
pub use bundle::{parse_key_bundle, parse_roster_bundle, KeyBundle, RosterBundle};
pub use error::{BundleError, ImportError};
pub use importer::{import_backup, ImportSummary};
pub use roster::{NullRosterSink, RosterSink};
