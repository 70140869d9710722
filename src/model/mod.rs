//! Data model for crawled catalog items
//!
//! - [`ItemRecord`]: one extracted item, immutable apart from its local image path
//! - [`CollectionUnit`]: a category or subcategory crawled as one bounded traversal
//! - [`RunSummary`]: ordered per-unit outcomes of one crawl invocation

mod record;
mod summary;
mod unit;

pub use record::{ItemFields, ItemRecord, SkipReason};
pub use summary::{RunSummary, UnitOutcome};
pub use unit::CollectionUnit;
