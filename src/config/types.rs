use serde::Deserialize;

/// Main configuration structure for Shelfwalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub source: SourceConfig,
    /// Categories crawled by the batch mode, in order
    #[serde(default = "default_categories", rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            politeness: PolitenessConfig::default(),
            transport: TransportConfig::default(),
            output: OutputConfig::default(),
            source: SourceConfig::default(),
            categories: default_categories(),
        }
    }
}

/// Breadth and depth caps for a crawl
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of items collected per crawl unit
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// Maximum number of subcategories crawled per category
    #[serde(rename = "max-subcategories", default = "default_max_subcategories")]
    pub max_subcategories: usize,

    /// Maximum number of listing pages walked per crawl unit
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Extra attempts for an image download after a transient failure
    #[serde(rename = "image-retries", default = "default_image_retries")]
    pub image_retries: u32,

    /// Base delay before an image retry, doubled on each attempt (milliseconds)
    #[serde(rename = "image-backoff-ms", default = "default_image_backoff_ms")]
    pub image_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_subcategories: default_max_subcategories(),
            max_pages: default_max_pages(),
            image_retries: default_image_retries(),
            image_backoff_ms: default_image_backoff_ms(),
        }
    }
}

/// An inclusive range of milliseconds a politeness pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,
    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never pauses
    pub const fn none() -> Self {
        Self::new(0, 0)
    }
}

/// Randomized pauses inserted between units of network work
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Between two item detail fetches
    #[serde(default = "default_item_delay")]
    pub item: DelayRange,

    /// After each listing page fetch
    #[serde(default = "default_page_delay")]
    pub page: DelayRange,

    /// Between two subcategories of one category
    #[serde(default = "default_unit_delay")]
    pub unit: DelayRange,

    /// Between two categories of a batch
    #[serde(default = "default_category_delay")]
    pub category: DelayRange,
}

impl PolitenessConfig {
    /// No pauses at all; used by tests and local fixtures
    pub fn disabled() -> Self {
        Self {
            item: DelayRange::none(),
            page: DelayRange::none(),
            unit: DelayRange::none(),
            category: DelayRange::none(),
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            item: default_item_delay(),
            page: default_page_delay(),
            unit: default_unit_delay(),
            category: default_category_delay(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound on waiting for a page to become ready (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Upper bound on a single image download attempt (seconds)
    #[serde(rename = "image-timeout-secs", default = "default_timeout_secs")]
    pub image_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_timeout_secs(),
            image_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for snapshots, images and ledgers
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,

    /// File name of the per-unit snapshot
    #[serde(rename = "snapshot-filename", default = "default_snapshot_filename")]
    pub snapshot_filename: String,

    /// Directory receiving the last-run reports
    #[serde(rename = "report-dir", default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_filename: default_snapshot_filename(),
            report_dir: default_report_dir(),
        }
    }
}

/// Which catalog this crawler is allowed to visit
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Domain patterns (e.g., "amazon.fr" or "*.amazon.fr")
    #[serde(default = "default_source_domains")]
    pub domains: Vec<String>,

    /// Category crawled by the default mode
    #[serde(rename = "default-category", default = "default_category_url")]
    pub default_category: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            domains: default_source_domains(),
            default_category: default_category_url(),
        }
    }
}

/// A named category for the batch mode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub url: String,
}

impl CategoryEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

fn default_max_items() -> usize {
    5
}

fn default_max_subcategories() -> usize {
    4
}

fn default_max_pages() -> usize {
    1
}

fn default_image_retries() -> u32 {
    2
}

fn default_image_backoff_ms() -> u64 {
    500
}

fn default_item_delay() -> DelayRange {
    DelayRange::new(200, 600)
}

fn default_page_delay() -> DelayRange {
    DelayRange::new(500, 1200)
}

fn default_unit_delay() -> DelayRange {
    DelayRange::new(600, 1600)
}

fn default_category_delay() -> DelayRange {
    DelayRange::new(1000, 2000)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_snapshot_filename() -> String {
    "products.json".to_string()
}

fn default_report_dir() -> String {
    "reports".to_string()
}

fn default_source_domains() -> Vec<String> {
    vec!["*.amazon.fr".to_string()]
}

fn default_category_url() -> String {
    "https://www.amazon.fr/b?node=13921051".to_string()
}

fn default_categories() -> Vec<CategoryEntry> {
    vec![
        CategoryEntry::new("technologie", "https://www.amazon.fr/b?node=13921051"),
        CategoryEntry::new("mode", "https://www.amazon.fr/b?node=11961521031"),
        CategoryEntry::new("maison", "https://www.amazon.fr/s?k=Maison"),
        CategoryEntry::new("sport", "https://www.amazon.fr/s?k=sport"),
    ]
}
