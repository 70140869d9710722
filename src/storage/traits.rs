//! Storage traits and error types
//!
//! This module defines the ledger interface used by the coordinator and the
//! error type shared by every on-disk artifact.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace {path}: {source}")]
    Replace {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent set of processed item identifiers, grouped by tag
///
/// Membership is global: an identifier marked under any tag counts as
/// processed. Mutation takes `&mut self`, so callers sharing a ledger across
/// tasks must wrap it in a lock; `claim` is then a single critical section.
pub trait IdentifierLedger {
    /// Returns true if the identifier was marked under any tag
    ///
    /// Always false for an empty identifier.
    fn is_processed(&self, identifier: &str) -> bool;

    /// Marks an identifier as processed under a tag and flushes to disk
    ///
    /// An empty identifier is ignored; an empty tag becomes `"default"`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The identifier was added under the tag and flushed
    /// * `Ok(false)` - Nothing changed
    /// * `Err(StorageError)` - The in-memory state changed but the flush failed
    fn mark_processed(&mut self, identifier: &str, tag: &str) -> StorageResult<bool>;

    /// Test-and-set: marks the identifier unless it was already processed
    ///
    /// Returns true if the caller is the first to claim the identifier. A
    /// failed flush is logged and retried at close; the claim still holds.
    fn claim(&mut self, identifier: &str, tag: &str) -> bool {
        if identifier.is_empty() || self.is_processed(identifier) {
            return false;
        }

        match self.mark_processed(identifier, tag) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("Ledger flush failed after marking {}: {}", identifier, e);
                true
            }
        }
    }

    /// Flushes the current state; safe to call more than once
    fn close(&mut self) -> StorageResult<()>;
}
