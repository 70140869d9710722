//! Per-unit item snapshots
//!
//! A snapshot is a pretty-printed JSON array of every record a unit produced
//! during the run, including records the ledger had already seen. It is
//! replaced atomically, so a reader never observes a half-written array.

use crate::model::ItemRecord;
use crate::storage::atomic::atomic_write_with;
use crate::storage::StorageResult;
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `records` to `<dir>/<filename>`, replacing any previous snapshot
///
/// A record that fails to serialize is written as a `{"repr": ...}`
/// placeholder instead of aborting the snapshot.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written snapshot
/// * `Err(StorageError)` - The directory or file could not be written
pub fn write_snapshot(records: &[ItemRecord], dir: &Path, filename: &str) -> StorageResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);

    let values: Vec<Value> = records.iter().map(snapshot_value).collect();
    atomic_write_with(&path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, &values).map_err(io::Error::from)
    })?;

    tracing::debug!("Wrote {} records to {}", values.len(), path.display());
    Ok(path)
}

/// Reads a snapshot back into records
pub fn read_snapshot(path: &Path) -> StorageResult<Vec<ItemRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn snapshot_value(record: &ItemRecord) -> Value {
    serde_json::to_value(record).unwrap_or_else(|e| {
        tracing::warn!("Record {} did not serialize: {}", record.identifier(), e);
        json!({ "repr": format!("{:?}", record) })
    })
}
