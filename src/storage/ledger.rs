//! JSON-backed identifier ledger
//!
//! The ledger lives at `<root>/.processed.json` as an object mapping each tag
//! to the identifiers marked under it:
//!
//! ```json
//! { "phones": ["A1", "A2"], "tablets": ["B7"] }
//! ```
//!
//! Files written by older versions wrap each list as `{"asins": [...]}`; both
//! shapes load. Any other content is treated as an empty ledger.

use crate::storage::atomic::atomic_write;
use crate::storage::{IdentifierLedger, StorageResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the ledger inside its root directory
pub const LEDGER_FILENAME: &str = ".processed.json";

/// Tag used when an identifier is marked without one
pub const DEFAULT_TAG: &str = "default";

/// Key of the legacy per-tag wrapper object
const LEGACY_LIST_KEY: &str = "asins";

/// Identifier ledger persisted as a JSON file
///
/// Opening never fails: a missing or unreadable file starts an empty ledger.
/// Every mutation that changes state is flushed atomically before returning.
/// The ledger flushes once more when closed or dropped.
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    tags: BTreeMap<String, Vec<String>>,
    index: HashSet<String>,
    closed: bool,
}

impl JsonLedger {
    /// Opens (or starts) the ledger under a root directory
    ///
    /// # Arguments
    ///
    /// * `root` - Directory holding `.processed.json`; created if missing
    pub fn open(root: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(root) {
            tracing::warn!("Could not create ledger root {}: {}", root.display(), e);
        }

        let path = root.join(LEDGER_FILENAME);
        let tags = load_tags(&path);
        let index = tags.values().flatten().cloned().collect();

        tracing::debug!(
            "Opened ledger {} ({} identifiers)",
            path.display(),
            tags.values().map(Vec::len).sum::<usize>()
        );

        Self {
            path,
            tags,
            index,
            closed: false,
        }
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers marked under a tag, in marking order
    pub fn identifiers(&self, tag: &str) -> &[String] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tags present in the ledger
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Number of distinct identifiers across all tags
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn flush(&self) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.tags)?;
        atomic_write(&self.path, &bytes)
    }
}

impl IdentifierLedger for JsonLedger {
    fn is_processed(&self, identifier: &str) -> bool {
        !identifier.is_empty() && self.index.contains(identifier)
    }

    fn mark_processed(&mut self, identifier: &str, tag: &str) -> StorageResult<bool> {
        if identifier.is_empty() {
            return Ok(false);
        }

        let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
        let list = self.tags.entry(tag.to_string()).or_default();
        if list.iter().any(|id| id == identifier) {
            return Ok(false);
        }

        list.push(identifier.to_string());
        self.index.insert(identifier.to_string());
        self.closed = false;

        self.flush()?;
        Ok(true)
    }

    fn close(&mut self) -> StorageResult<()> {
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for JsonLedger {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::error!("Failed to flush ledger {}: {}", self.path.display(), e);
        }
    }
}

/// Reads the tag map, tolerating both file shapes and any corruption
fn load_tags(path: &Path) -> BTreeMap<String, Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!("Could not read ledger {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "Ledger {} is not valid JSON, starting empty: {}",
                path.display(),
                e
            );
            return BTreeMap::new();
        }
    };

    let Value::Object(entries) = value else {
        tracing::warn!(
            "Ledger {} is not a tag object, starting empty",
            path.display()
        );
        return BTreeMap::new();
    };

    entries
        .into_iter()
        .map(|(tag, value)| (tag, identifier_list(value)))
        .collect()
}

fn identifier_list(value: Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut wrapper) => match wrapper.remove(LEGACY_LIST_KEY) {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}
