//! Shelfwalk: a bounded catalog crawler
//!
//! This crate walks a shallow catalog hierarchy (category → subcategories →
//! paginated listings → item pages), extracts item records, snapshots them per
//! crawl unit and keeps a persistent identifier ledger so repeated runs never
//! count the same item twice.

pub mod config;
pub mod crawler;
pub mod model;
pub mod naming;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Shelfwalk operations
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Category URL is not on an allowed source domain: {url}")]
    InvalidSource { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Shelfwalk operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, HttpSession, TransportSession};
pub use model::{CollectionUnit, ItemRecord, RunSummary, UnitOutcome};
pub use storage::{JsonLedger, write_snapshot};
