// SPDX-License-Identifier: Apache-2.0
//! The roster is an external collaborator (out of scope per the
//! purpose statement): this crate never interprets member/squad shape,
//! it only hands the backup's raw records to whatever the host wires up.

use serde_json::Value;

/// Host-provided sink for roster data carried by a backup document or a
/// roster bundle.
pub trait RosterSink {
    /// Upsert member records. Shape is owned entirely by the host.
    fn upsert_members(&mut self, members: &[Value]);

    /// Upsert squad records. Shape is owned entirely by the host.
    fn upsert_squads(&mut self, squads: &[Value]);
}

/// A [`RosterSink`] that discards everything, for callers that only
/// care about packets/keys (tests, `xtoc-cli decode`).
#[derive(Debug, Default)]
pub struct NullRosterSink;

impl RosterSink for NullRosterSink {
    fn upsert_members(&mut self, _members: &[Value]) {}
    fn upsert_squads(&mut self, _squads: &[Value]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_any_input_without_panicking() {
        let mut sink = NullRosterSink;
        sink.upsert_members(&[Value::String("m".to_owned())]);
        sink.upsert_squads(&[]);
    }
}
