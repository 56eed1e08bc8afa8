// SPDX-License-Identifier: Apache-2.0
//! `xtoc-cli import` — run a backup document through the importer against
//! an on-disk packet store.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use comfy_table::Table;
use xtoc_import::{import_backup, BackupDocument, NullRosterSink};
use xtoc_store::{KeyTable, PacketStore};

/// Arguments for `xtoc-cli import`.
#[derive(Debug, clap::Args)]
pub struct ImportArgs {
    /// Path to the backup JSON document to import.
    pub backup: PathBuf,
    /// Path to the on-disk packet store (created if missing).
    #[arg(long)]
    pub store: PathBuf,
    /// Source tag recorded against every imported packet.
    #[arg(long, default_value = "backup-import")]
    pub source: String,
}

/// Run `xtoc-cli import`.
pub async fn run(args: &ImportArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.backup)
        .with_context(|| format!("reading {}", args.backup.display()))?;
    let doc = BackupDocument::parse(&json).context("parsing backup document")?;

    let store = PacketStore::open(&args.store)
        .with_context(|| format!("opening store at {}", args.store.display()))?;
    let keys = KeyTable::new();
    let mut roster = NullRosterSink;
    let cancel = AtomicBool::new(false);

    let summary = import_backup(&doc, &store, &keys, &mut roster, &args.source, &cancel)
        .await
        .context("importing backup")?;

    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["rosterTotal".to_owned(), summary.roster_total.to_string()]);
    table.add_row(vec!["keysImported".to_owned(), summary.keys_imported.to_string()]);
    table.add_row(vec!["keysFailed".to_owned(), summary.keys_failed.to_string()]);
    table.add_row(vec!["packetsParsed".to_owned(), summary.packets_parsed.to_string()]);
    table.add_row(vec!["packetsStored".to_owned(), summary.packets_stored.to_string()]);
    table.add_row(vec![
        "packetsStoreSkipped".to_owned(),
        summary.packets_store_skipped.to_string(),
    ]);
    table.add_row(vec!["packetsNoGeo".to_owned(), summary.packets_no_geo.to_string()]);
    table.add_row(vec!["markersAdded".to_owned(), summary.markers_added.to_string()]);
    table.add_row(vec![
        "markersDuplicate".to_owned(),
        summary.markers_duplicate.to_string(),
    ]);
    table.add_row(vec!["zoneDecoded".to_owned(), summary.zone_decoded.to_string()]);
    table.add_row(vec![
        "zoneDecodeFailed".to_owned(),
        summary.zone_decode_failed.to_string(),
    ]);

    println!("{table}");
    Ok(())
}
