//! Paginated item crawler
//!
//! One crawl unit is walked as:
//!
//! ```text
//! FETCH_PAGE -> EXTRACT_LINKS -> (FETCH_ITEM -> PARSE_ITEM -> [FETCH_IMAGE] -> EMIT)* -> ADVANCE_PAGE
//! ```
//!
//! The walk stops when a page has no item links, when the page cap or the
//! item cap is reached, when a page fails to load, or when there is no next
//! page. A failing item never stops the walk.

use crate::config::PolitenessConfig;
use crate::crawler::extract::{ListingLink, MarkupExtractor};
use crate::crawler::images::{ImageStore, IMAGES_DIR};
use crate::crawler::politeness::Jitter;
use crate::crawler::transport::TransportSession;
use crate::model::{CollectionUnit, ItemRecord, SkipReason};
use crate::storage::write_snapshot;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Caps applied to a single unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Records emitted before the unit stops
    pub max_items: usize,
    /// Listing pages fetched before the unit stops
    pub max_pages: usize,
}

/// Result of visiting one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Emitted(ItemRecord),
    Skipped {
        identifier: String,
        reason: SkipReason,
    },
}

/// What a unit crawl produced
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    /// Every record built, in visit order, regardless of the ledger
    pub records: Vec<ItemRecord>,
    /// Items that were visited but did not become records
    pub skipped: usize,
    /// Listing pages fetched
    pub pages: usize,
    /// Snapshot location, if the snapshot could be written
    pub snapshot: Option<PathBuf>,
}

/// Walks one unit's listing pages and builds its records
pub struct UnitCrawler<'a> {
    extractor: &'a dyn MarkupExtractor,
    images: ImageStore,
    item_delay: Jitter,
    page_delay: Jitter,
    snapshot_filename: &'a str,
}

impl<'a> UnitCrawler<'a> {
    pub fn new(
        extractor: &'a dyn MarkupExtractor,
        images: ImageStore,
        politeness: &PolitenessConfig,
        snapshot_filename: &'a str,
    ) -> Self {
        Self {
            extractor,
            images,
            item_delay: Jitter::new(politeness.item),
            page_delay: Jitter::new(politeness.page),
            snapshot_filename,
        }
    }

    /// Crawls a unit and snapshots its records in the unit's directory
    ///
    /// # Arguments
    ///
    /// * `session` - Transport used for every page, item and image
    /// * `unit` - The unit to crawl
    /// * `root` - Output root the unit directory is derived from
    /// * `limits` - Page and item caps
    pub async fn crawl_unit(
        &self,
        session: &mut dyn TransportSession,
        unit: &CollectionUnit,
        root: &Path,
        limits: CrawlLimits,
    ) -> UnitReport {
        let dir = unit.directory_under(root);
        let images_dir = dir.join(IMAGES_DIR);
        if let Err(e) = fs::create_dir_all(&images_dir) {
            tracing::warn!("Could not create {}: {}", images_dir.display(), e);
        }

        let mut report = UnitReport::default();

        match Url::parse(unit.url()) {
            Ok(start) => {
                self.walk(session, unit, start, &images_dir, limits, &mut report)
                    .await
            }
            Err(e) => tracing::warn!("Unit {} has an invalid URL {}: {}", unit.name(), unit.url(), e),
        }

        report.snapshot = match write_snapshot(&report.records, &dir, self.snapshot_filename) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Snapshot for {} failed: {}", unit.name(), e);
                None
            }
        };

        tracing::info!(
            "Unit {}: {} records, {} skipped, {} pages",
            unit.name(),
            report.records.len(),
            report.skipped,
            report.pages
        );
        report
    }

    async fn walk(
        &self,
        session: &mut dyn TransportSession,
        unit: &CollectionUnit,
        start: Url,
        images_dir: &Path,
        limits: CrawlLimits,
        report: &mut UnitReport,
    ) {
        let mut page_url = start;
        let mut seen = HashSet::new();

        'pages: while report.pages < limits.max_pages && report.records.len() < limits.max_items {
            let markup = match session.fetch(page_url.as_str()).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::warn!("Listing page {} failed: {}", page_url, e);
                    break;
                }
            };
            report.pages += 1;
            self.page_delay.pause().await;

            let links = self.extractor.listing_links(&markup, &page_url);
            if links.is_empty() {
                tracing::debug!("No item links on {}", page_url);
                break;
            }

            for link in links {
                if report.records.len() >= limits.max_items {
                    break 'pages;
                }
                if !seen.insert(link.identifier.clone()) {
                    continue;
                }

                match self.crawl_item(session, &link, unit, images_dir).await {
                    ItemOutcome::Emitted(record) => report.records.push(record),
                    ItemOutcome::Skipped { identifier, reason } => {
                        tracing::warn!("Skipping item {}: {}", identifier, reason);
                        report.skipped += 1;
                    }
                }
                self.item_delay.pause().await;
            }

            match self.extractor.next_page_url(&markup, &page_url) {
                Some(next) => page_url = next,
                None => break,
            }
        }
    }

    /// Fetches, parses and (optionally) downloads the image of one item
    pub async fn crawl_item(
        &self,
        session: &mut dyn TransportSession,
        link: &ListingLink,
        unit: &CollectionUnit,
        images_dir: &Path,
    ) -> ItemOutcome {
        let skipped = |reason| ItemOutcome::Skipped {
            identifier: link.identifier.clone(),
            reason,
        };

        let markup = match session.fetch(link.url.as_str()).await {
            Ok(markup) => markup,
            Err(e) => return skipped(SkipReason::Fetch(e.to_string())),
        };

        let fields = self.extractor.item_fields(&markup, &link.url);
        let mut record =
            match ItemRecord::new(&link.identifier, link.url.as_str(), unit.name(), fields) {
                Ok(record) => record,
                Err(reason) => return skipped(reason),
            };

        if let Some(image_url) = record.image_url().map(str::to_string) {
            let stored = self
                .images
                .fetch_and_store(
                    session,
                    &image_url,
                    images_dir,
                    record.name(),
                    record.identifier(),
                )
                .await;
            if let Some(path) = stored {
                record.set_image_local(path.display().to_string());
            }
        }

        ItemOutcome::Emitted(record)
    }
}
