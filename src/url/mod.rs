//! URL handling module for Shelfwalk
//!
//! This module provides source-domain checks, href resolution and category
//! name inference.

mod domain;
mod matcher;
mod resolve;

// Re-export main functions
pub use domain::{extract_domain, infer_category_name, is_source_url};
pub use matcher::{matches_any, matches_wildcard};
pub use resolve::{resolve_href, strip_query};
