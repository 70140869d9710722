//! Storage module for persistent crawl artifacts
//!
//! This module handles:
//! - The identifier ledger that suppresses already-seen items across runs
//! - Per-unit JSON snapshots of collected records
//! - Atomic replacement of every file it writes

mod atomic;
mod ledger;
mod snapshot;
mod traits;

pub use atomic::{atomic_write, atomic_write_with, TEMP_PREFIX};
pub use ledger::{JsonLedger, DEFAULT_TAG, LEDGER_FILENAME};
pub use snapshot::{read_snapshot, write_snapshot};
pub use traits::{IdentifierLedger, StorageError, StorageResult};
