//! Configuration module for Shelfwalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use shelfwalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelfwalk.toml")).unwrap();
//! println!("Items per unit: {}", config.crawler.max_items);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryEntry, Config, CrawlerConfig, DelayRange, OutputConfig, PolitenessConfig,
    SourceConfig, TransportConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
