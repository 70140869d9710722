//! Output module for run reports
//!
//! This module handles:
//! - Archiving each run summary as JSON
//! - Writing a readable digest of the last run per mode
//! - Printing the summary to stdout

mod report;

pub use report::{
    format_text_report, print_summary, write_run_report, ReportPaths, RunKind, RunReport,
};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Write(#[from] crate::storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
