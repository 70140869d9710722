//! Crawler coordinator - crawl session orchestration
//!
//! This module drives the three entry modes:
//! - the configured default category
//! - an arbitrary category URL, checked against the source domains
//! - a batch of named categories sharing one session and one ledger
//!
//! Every mode owns its ledger for the duration of the run and opens a
//! transport session unless the caller injected one. Injected sessions are
//! never closed here; sessions this module opened are always closed.

use crate::config::{CategoryEntry, Config};
use crate::crawler::extract::{CatalogExtractor, MarkupExtractor};
use crate::crawler::http::HttpSessionFactory;
use crate::crawler::images::ImageStore;
use crate::crawler::politeness::{Backoff, Jitter};
use crate::crawler::resolver::SubcategoryResolver;
use crate::crawler::transport::{SessionFactory, TransportSession};
use crate::crawler::unit::{CrawlLimits, UnitCrawler};
use crate::model::{CollectionUnit, ItemRecord, RunSummary, UnitOutcome};
use crate::naming::safe_key;
use crate::storage::{IdentifierLedger, JsonLedger};
use crate::url::{infer_category_name, is_source_url};
use std::path::{Path, PathBuf};
use url::Url;

/// Output root of the default mode, under the data directory
pub const DEFAULT_ROOT: &str = "default";

/// Output root of the arbitrary-category mode
pub const CATEGORIES_ROOT: &str = "categories";

/// Output root of the batch mode
pub const BATCH_ROOT: &str = "all_categories";

/// Upper bound on the image retry backoff
const MAX_IMAGE_BACKOFF_MS: u64 = 8_000;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    factory: Box<dyn SessionFactory>,
    extractor: Box<dyn MarkupExtractor>,
    resolver: SubcategoryResolver,
}

/// The transport session of one run, owned or borrowed
enum SessionHandle<'s> {
    Owned(Box<dyn TransportSession>),
    Borrowed(&'s mut dyn TransportSession),
}

impl<'s> SessionHandle<'s> {
    fn get(&mut self) -> &mut dyn TransportSession {
        match self {
            SessionHandle::Owned(session) => session.as_mut(),
            SessionHandle::Borrowed(session) => &mut **session,
        }
    }

    /// Closes owned sessions; teardown failures are logged and swallowed
    async fn release(self) {
        if let SessionHandle::Owned(mut session) = self {
            if let Err(e) = session.close().await {
                tracing::error!("Failed to close transport session: {}", e);
            }
        }
    }
}

impl Coordinator {
    /// Creates a coordinator using HTTP sessions and the catalog extractor
    pub fn new(config: Config) -> Self {
        let factory = HttpSessionFactory::new(config.transport.clone());

        Self {
            config,
            factory: Box::new(factory),
            extractor: Box::new(CatalogExtractor),
            resolver: SubcategoryResolver::default(),
        }
    }

    /// Replaces the factory used when no session is injected
    pub fn with_session_factory(mut self, factory: impl SessionFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    pub fn with_extractor(mut self, extractor: impl MarkupExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_resolver(mut self, resolver: SubcategoryResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the default mode: `<data>/default`
    pub fn default_root(&self) -> PathBuf {
        Path::new(&self.config.output.data_dir).join(DEFAULT_ROOT)
    }

    /// Root of the arbitrary-category mode: `<data>/categories`
    pub fn categories_root(&self) -> PathBuf {
        Path::new(&self.config.output.data_dir).join(CATEGORIES_ROOT)
    }

    /// Root of the batch mode: `<data>/all_categories`
    pub fn batch_root(&self) -> PathBuf {
        Path::new(&self.config.output.data_dir).join(BATCH_ROOT)
    }

    /// Crawls the configured default category
    ///
    /// # Arguments
    ///
    /// * `session` - Transport to use instead of opening one; left open
    pub async fn crawl_default(
        &self,
        session: Option<&mut dyn TransportSession>,
    ) -> RunSummary {
        let url = self.config.source.default_category.clone();
        let name = category_name(&url);
        let root = self.default_root();

        tracing::info!("Default crawl of {} into {}", url, root.display());
        self.crawl_single(session, &name, &url, &root).await
    }

    /// Crawls an arbitrary category URL
    ///
    /// A URL outside the source domains yields an empty summary without
    /// touching the network or the filesystem.
    ///
    /// # Arguments
    ///
    /// * `category_url` - The category to crawl
    /// * `base_dir` - Output root; defaults to `<data>/categories`
    /// * `session` - Transport to use instead of opening one; left open
    pub async fn crawl_category(
        &self,
        category_url: &str,
        base_dir: Option<&Path>,
        session: Option<&mut dyn TransportSession>,
    ) -> RunSummary {
        let category_url = category_url.trim();
        if !is_source_url(category_url, &self.config.source.domains) {
            tracing::warn!(
                "Refusing {}: not on an allowed source domain ({})",
                category_url,
                self.config.source.domains.join(", ")
            );
            return RunSummary::new();
        }

        let name = category_name(category_url);
        let root = base_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.categories_root());

        tracing::info!("Category crawl of {} ({}) into {}", name, category_url, root.display());
        self.crawl_single(session, &name, category_url, &root).await
    }

    /// Crawls named categories with one shared session and one shared ledger
    ///
    /// Each category lands in `<data>/all_categories/<safe name>`; summary
    /// names are prefixed with the category name. Categories outside the
    /// source domains are skipped.
    pub async fn crawl_batch(
        &self,
        categories: &[CategoryEntry],
        session: Option<&mut dyn TransportSession>,
    ) -> RunSummary {
        let root = self.batch_root();
        let mut summary = RunSummary::new();

        let Some(mut handle) = self.acquire(session).await else {
            return summary;
        };
        let mut ledger = JsonLedger::open(&root);
        let category_delay = Jitter::new(self.config.politeness.category);
        let mut crawled_any = false;

        for entry in categories {
            if !is_source_url(&entry.url, &self.config.source.domains) {
                tracing::warn!("Skipping category {}: {} is not a source URL", entry.name, entry.url);
                continue;
            }

            if crawled_any {
                category_delay.pause().await;
            }
            crawled_any = true;

            tracing::info!("Batch category {} ({})", entry.name, entry.url);
            let dir = root.join(safe_key(&entry.name));
            let part = self
                .crawl_category_units(
                    handle.get(),
                    &mut ledger,
                    &entry.name,
                    &entry.url,
                    &dir,
                    Some(&entry.name),
                )
                .await;
            summary.extend(part);
        }

        close_ledger(&mut ledger);
        handle.release().await;

        log_summary("batch", &summary);
        summary
    }

    /// One category under one root, with its own session and ledger
    async fn crawl_single(
        &self,
        session: Option<&mut dyn TransportSession>,
        name: &str,
        url: &str,
        root: &Path,
    ) -> RunSummary {
        let Some(mut handle) = self.acquire(session).await else {
            return RunSummary::new();
        };
        let mut ledger = JsonLedger::open(root);

        let summary = self
            .crawl_category_units(handle.get(), &mut ledger, name, url, root, None)
            .await;

        close_ledger(&mut ledger);
        handle.release().await;

        log_summary(name, &summary);
        summary
    }

    /// Resolves a category's subcategories and crawls each as a unit
    ///
    /// With no subcategories the category page itself becomes the single
    /// unit, stored in `<root>/<safe category name>`.
    async fn crawl_category_units(
        &self,
        session: &mut dyn TransportSession,
        ledger: &mut dyn IdentifierLedger,
        category_name: &str,
        category_url: &str,
        root: &Path,
        batch_prefix: Option<&str>,
    ) -> RunSummary {
        let crawler_config = &self.config.crawler;
        let subcategories = self
            .resolver
            .resolve(session, category_url, crawler_config.max_subcategories)
            .await;

        let units: Vec<CollectionUnit> = if subcategories.is_empty() {
            vec![CollectionUnit::new(category_name, category_url)
                .with_output_dir(root.join(safe_key(category_name)))]
        } else {
            subcategories
                .into_iter()
                .take(crawler_config.max_subcategories)
                .map(|(key, url)| CollectionUnit::new(key, url))
                .collect()
        };

        let images = ImageStore::new(
            crawler_config.image_retries,
            Backoff::new(crawler_config.image_backoff_ms, MAX_IMAGE_BACKOFF_MS),
        );
        let crawler = UnitCrawler::new(
            self.extractor.as_ref(),
            images,
            &self.config.politeness,
            &self.config.output.snapshot_filename,
        );
        let limits = CrawlLimits {
            max_items: crawler_config.max_items,
            max_pages: crawler_config.max_pages,
        };
        let unit_delay = Jitter::new(self.config.politeness.unit);

        let mut summary = RunSummary::new();
        for (index, unit) in units.iter().enumerate() {
            if index > 0 {
                unit_delay.pause().await;
            }

            tracing::info!("Crawling {} ({})", unit.name(), unit.url());
            let report = crawler.crawl_unit(session, unit, root, limits).await;
            let saved = record_new_items(ledger, unit, &report.records);

            let name = match batch_prefix {
                Some(category) if category != unit.name() => {
                    format!("{}_{}", category, unit.name())
                }
                _ => unit.name().to_string(),
            };
            summary.push(UnitOutcome::new(name, unit.url(), saved));
        }

        summary
    }

    async fn acquire<'s>(
        &self,
        injected: Option<&'s mut dyn TransportSession>,
    ) -> Option<SessionHandle<'s>> {
        if let Some(session) = injected {
            return Some(SessionHandle::Borrowed(session));
        }

        match self.factory.open().await {
            Ok(session) => Some(SessionHandle::Owned(session)),
            Err(e) => {
                tracing::error!("Could not open a transport session: {}", e);
                None
            }
        }
    }
}

/// Claims each record in the ledger under the unit's tag
///
/// Returns how many records had not been processed before.
pub fn record_new_items(
    ledger: &mut dyn IdentifierLedger,
    unit: &CollectionUnit,
    records: &[ItemRecord],
) -> usize {
    let tag = unit.key();
    records
        .iter()
        .filter(|record| ledger.claim(record.identifier(), &tag))
        .count()
}

fn category_name(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => infer_category_name(&parsed),
        Err(_) => safe_key(url),
    }
}

fn close_ledger(ledger: &mut JsonLedger) {
    if let Err(e) = ledger.close() {
        tracing::error!("Failed to close ledger {}: {}", ledger.path().display(), e);
    }
}

fn log_summary(label: &str, summary: &RunSummary) {
    tracing::info!(
        "Run {} finished: {} units, {} new items",
        label,
        summary.len(),
        summary.total_saved()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolitenessConfig;
    use crate::crawler::testing::{FixtureFactory, FixtureSession};
    use crate::storage::{read_snapshot, LEDGER_FILENAME};
    use tempfile::TempDir;

    const CATEGORY: &str = "https://shop.example/b?node=1";
    const PHONES: &str = "https://shop.example/s?k=phones";
    const TABLETS: &str = "https://shop.example/s?k=tablets";

    fn config(data_dir: &Path) -> Config {
        let mut config = Config::default();
        config.crawler.max_items = 2;
        config.crawler.max_pages = 1;
        config.crawler.image_backoff_ms = 0;
        config.politeness = PolitenessConfig::disabled();
        config.output.data_dir = data_dir.display().to_string();
        config.source.domains = vec!["shop.example".to_string()];
        config.source.default_category = CATEGORY.to_string();
        config
    }

    fn menu(entries: &[(&str, &str)]) -> String {
        let anchors: String = entries
            .iter()
            .map(|(label, href)| format!(r#"<a href="{href}">{label}</a>"#))
            .collect();
        format!("<html><body><nav>{anchors}</nav></body></html>")
    }

    fn listing(ids: &[&str]) -> String {
        let items: String = ids
            .iter()
            .map(|id| format!(r#"<div data-asin="{id}"><a href="/item/dp/{id}">{id}</a></div>"#))
            .collect();
        format!("<html><body>{items}</body></html>")
    }

    fn with_items(mut session: FixtureSession, ids: &[&str]) -> FixtureSession {
        for id in ids {
            session = session.with_page(
                &format!("https://shop.example/item/dp/{}", id),
                format!(r#"<span id="productTitle">Item {id}</span>"#),
            );
        }
        session
    }

    fn catalog() -> FixtureSession {
        let session = FixtureSession::new()
            .with_page(CATEGORY, menu(&[("phones", "/s?k=phones"), ("tablets", "/s?k=tablets")]))
            .with_page(PHONES, listing(&["P1", "P2", "P3"]))
            .with_page(TABLETS, listing(&["T1", "T2", "T3"]));
        with_items(session, &["P1", "P2", "P3", "T1", "T2", "T3"])
    }

    fn snapshot_len(path: PathBuf) -> usize {
        read_snapshot(&path).unwrap().len()
    }

    #[tokio::test]
    async fn test_end_to_end_two_subcategories() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let mut session = catalog();

        let summary = coordinator
            .crawl_category(CATEGORY, Some(dir.path()), Some(&mut session))
            .await;

        assert_eq!(
            summary.as_tuples(),
            vec![("phones", PHONES, 2), ("tablets", TABLETS, 2)]
        );
        assert_eq!(snapshot_len(dir.path().join("phones/products.json")), 2);
        assert_eq!(snapshot_len(dir.path().join("tablets/products.json")), 2);
        assert!(dir.path().join(LEDGER_FILENAME).is_file());
    }

    #[tokio::test]
    async fn test_rerun_suppresses_duplicates() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let mut session = catalog();

        coordinator
            .crawl_category(CATEGORY, Some(dir.path()), Some(&mut session))
            .await;
        let second = coordinator
            .crawl_category(CATEGORY, Some(dir.path()), Some(&mut session))
            .await;

        assert_eq!(
            second.as_tuples(),
            vec![("phones", PHONES, 0), ("tablets", TABLETS, 0)]
        );
        // Snapshots are independent of deduplication
        assert_eq!(snapshot_len(dir.path().join("phones/products.json")), 2);
        assert_eq!(snapshot_len(dir.path().join("tablets/products.json")), 2);
    }

    #[tokio::test]
    async fn test_identifier_counted_once_across_units() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let session = FixtureSession::new()
            .with_page(CATEGORY, menu(&[("phones", "/s?k=phones"), ("tablets", "/s?k=tablets")]))
            .with_page(PHONES, listing(&["X1", "P1"]))
            .with_page(TABLETS, listing(&["X1", "T1"]));
        let mut session = with_items(session, &["X1", "P1", "T1"]);

        let summary = coordinator
            .crawl_category(CATEGORY, Some(dir.path()), Some(&mut session))
            .await;

        assert_eq!(summary.as_tuples()[0].2, 2);
        assert_eq!(summary.as_tuples()[1].2, 1);
        assert_eq!(snapshot_len(dir.path().join("tablets/products.json")), 2);
    }

    #[tokio::test]
    async fn test_invalid_domain_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let factory = FixtureFactory::new(catalog());
        let coordinator =
            Coordinator::new(config(dir.path())).with_session_factory(factory.clone());
        let root = dir.path().join("out");

        let summary = coordinator
            .crawl_category("https://elsewhere.example/b?node=1", Some(&root), None)
            .await;

        assert!(summary.is_empty());
        assert_eq!(factory.opened(), 0);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_category_without_subcategories_is_crawled_itself() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let url = "https://shop.example/s?k=lampes";
        let mut session = with_items(
            FixtureSession::new().with_page(url, listing(&["L1", "L2", "L3"])),
            &["L1", "L2", "L3"],
        );

        let summary = coordinator
            .crawl_category(url, None, Some(&mut session))
            .await;

        assert_eq!(summary.as_tuples(), vec![("lampes", url, 2)]);
        let root = coordinator.categories_root();
        assert_eq!(snapshot_len(root.join("lampes/products.json")), 2);
        assert!(root.join(LEDGER_FILENAME).is_file());
    }

    #[tokio::test]
    async fn test_owned_session_closed_injected_left_open() {
        let dir = TempDir::new().unwrap();
        let shared = catalog();
        let factory = FixtureFactory::new(shared.clone());
        let coordinator =
            Coordinator::new(config(dir.path())).with_session_factory(factory.clone());

        coordinator.crawl_default(None).await;
        assert_eq!(factory.opened(), 1);
        assert_eq!(shared.close_count(), 1);

        let mut injected = shared.clone();
        coordinator.crawl_default(Some(&mut injected)).await;
        assert_eq!(factory.opened(), 1);
        assert_eq!(shared.close_count(), 1);
    }

    #[tokio::test]
    async fn test_default_mode_root() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let mut session = catalog();

        let summary = coordinator.crawl_default(Some(&mut session)).await;

        assert_eq!(summary.total_saved(), 4);
        let root = dir.path().join(DEFAULT_ROOT);
        assert_eq!(snapshot_len(root.join("phones/products.json")), 2);
        assert!(root.join(LEDGER_FILENAME).is_file());
    }

    #[tokio::test]
    async fn test_session_open_failure_yields_empty_summary() {
        let dir = TempDir::new().unwrap();
        let coordinator =
            Coordinator::new(config(dir.path())).with_session_factory(FixtureFactory::failing());

        assert!(coordinator.crawl_default(None).await.is_empty());
        assert!(coordinator.crawl_batch(&[], None).await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_shares_ledger_and_prefixes_names() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config(dir.path()));
        let lamps = "https://shop.example/s?k=lampes";
        let session = catalog().with_page(lamps, listing(&["P1", "L1"]));
        let mut session = with_items(session, &["L1"]);

        let categories = vec![
            CategoryEntry::new("tech", CATEGORY),
            CategoryEntry::new("foreign", "https://elsewhere.example/s?k=x"),
            CategoryEntry::new("maison", lamps),
        ];
        let summary = coordinator.crawl_batch(&categories, Some(&mut session)).await;

        assert_eq!(
            summary.as_tuples(),
            vec![
                ("tech_phones", PHONES, 2),
                ("tech_tablets", TABLETS, 2),
                // P1 was already claimed under tech
                ("maison", lamps, 1),
            ]
        );

        let root = coordinator.batch_root();
        assert!(root.join(LEDGER_FILENAME).is_file());
        assert!(!root.join("tech").join(LEDGER_FILENAME).exists());
        assert_eq!(snapshot_len(root.join("tech/phones/products.json")), 2);
        assert_eq!(snapshot_len(root.join("maison/maison/products.json")), 2);
        assert!(!root.join("foreign").exists());
    }

    #[test]
    fn test_record_new_items_uses_unit_key() {
        let dir = TempDir::new().unwrap();
        let mut ledger = JsonLedger::open(dir.path());
        let unit = CollectionUnit::new("Smart Home", "https://shop.example/s?k=home");
        let record = ItemRecord::new(
            "H1",
            "https://shop.example/dp/H1",
            "Smart Home",
            crate::model::ItemFields {
                name: Some("Hub".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let records = vec![record.clone(), record];
        assert_eq!(record_new_items(&mut ledger, &unit, &records), 1);
        assert_eq!(ledger.identifiers("Smart_Home"), ["H1".to_string()]);
    }
}
