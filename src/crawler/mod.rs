//! Crawler module for catalog traversal
//!
//! This module contains the core crawling logic, including:
//! - The transport seam and its reqwest implementation
//! - Markup extraction for listing, item and category pages
//! - Subcategory resolution as an ordered strategy chain
//! - Randomized politeness pauses and image retry backoff
//! - The paginated unit crawler and the session coordinator

mod coordinator;
mod extract;
mod http;
mod images;
mod politeness;
mod resolver;
mod transport;
mod unit;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{record_new_items, Coordinator, BATCH_ROOT, CATEGORIES_ROOT, DEFAULT_ROOT};
pub use extract::{
    link_class_subcategories, listing_anchor_subcategories, CatalogExtractor, ListingLink,
    MarkupExtractor,
};
pub use http::{build_http_client, HttpSession, HttpSessionFactory};
pub use images::{image_filename, ImageStore, IMAGES_DIR};
pub use politeness::{Backoff, Jitter};
pub use resolver::{MarkupHeuristic, ResolveStrategy, SubcategoryMap, SubcategoryResolver};
pub use transport::{FetchError, FetchedBytes, SessionFactory, TransportSession};
pub use unit::{CrawlLimits, ItemOutcome, UnitCrawler, UnitReport};
