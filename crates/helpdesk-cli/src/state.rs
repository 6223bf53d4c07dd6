//! Snapshot persistence for the CLI.
//!
//! The engine is in-memory; the CLI carries state between invocations as a
//! single JSON snapshot file. One read at startup, one atomic
//! write-then-rename after a successful mutation. This is presentation
//! glue, not a storage engine.

use anyhow::Context;
use helpdesk_core::store::{Snapshot, TicketStore};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Load a store from `path`, or start empty if the file does not exist yet.
pub fn load(path: &Path) -> anyhow::Result<TicketStore> {
    match fs::read(path) {
        Ok(bytes) => {
            let snapshot: Snapshot = serde_json::from_slice(&bytes)
                .with_context(|| format!("malformed snapshot file {}", path.display()))?;
            Ok(TicketStore::from_snapshot(snapshot))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(TicketStore::new()),
        Err(err) => {
            Err(err).with_context(|| format!("cannot read snapshot file {}", path.display()))
        }
    }
}

/// Write the store to `path` atomically (temp sibling + rename).
pub fn save(path: &Path, store: &TicketStore) -> anyhow::Result<()> {
    let snapshot = store.snapshot();
    let json = serde_json::to_vec_pretty(&snapshot).context("serialize snapshot")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, &json)
        .with_context(|| format!("cannot write snapshot file {}", tmp.display()))?;
    fs::rename(tmp, path)
        .with_context(|| format!("cannot move snapshot into place at {}", path.display()))?;
    Ok(())
}
