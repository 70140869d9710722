//! Shelfwalk main entry point
//!
//! This is the command-line interface for the Shelfwalk catalog crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use shelfwalk::config::{load_config_with_hash, validate, CategoryEntry, Config};
use shelfwalk::output::{print_summary, write_run_report, RunKind};
use shelfwalk::url::is_source_url;
use shelfwalk::{Coordinator, RunSummary, ShelfError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shelfwalk: a bounded catalog crawler
///
/// Shelfwalk walks category pages down to their subcategories and item pages,
/// snapshots the items it finds and remembers them, so a second run only
/// counts what is new.
#[derive(Parser, Debug)]
#[command(name = "shelfwalk")]
#[command(version)]
#[command(about = "A bounded catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the configured default category
    Default,

    /// Crawl an arbitrary category URL
    Category {
        /// Category page URL on an allowed source domain
        url: String,

        /// Output root instead of <data-dir>/categories
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Crawl the configured categories (all of them, or only NAMES)
    Batch {
        #[arg(value_name = "NAMES")]
        names: Vec<String>,
    },

    /// Validate config and show what would be crawled without crawling
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    let (kind, summary) = match cli.command {
        Command::Check => {
            handle_check(&config);
            return Ok(());
        }
        Command::Default => {
            let coordinator = Coordinator::new(config.clone());
            (RunKind::Default, coordinator.crawl_default(None).await)
        }
        Command::Category { url, out_dir } => {
            if !is_source_url(&url, &config.source.domains) {
                return Err(ShelfError::InvalidSource { url }.into());
            }
            let coordinator = Coordinator::new(config.clone());
            let summary = coordinator
                .crawl_category(&url, out_dir.as_deref(), None)
                .await;
            (RunKind::Category, summary)
        }
        Command::Batch { names } => {
            let categories = select_categories(&config.categories, &names)?;
            let coordinator = Coordinator::new(config.clone());
            (RunKind::Batch, coordinator.crawl_batch(&categories, None).await)
        }
    };

    finish(kind, &summary, &config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelfwalk=info,warn"),
            1 => EnvFilter::new("shelfwalk=debug,info"),
            2 => EnvFilter::new("shelfwalk=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, else validated defaults
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config).context("built-in defaults are invalid")?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Picks batch categories by name, keeping config order
fn select_categories(
    categories: &[CategoryEntry],
    names: &[String],
) -> anyhow::Result<Vec<CategoryEntry>> {
    if names.is_empty() {
        return Ok(categories.to_vec());
    }

    for name in names {
        if !categories.iter().any(|c| &c.name == name) {
            bail!("unknown category '{}'", name);
        }
    }

    Ok(categories
        .iter()
        .filter(|c| names.contains(&c.name))
        .cloned()
        .collect())
}

/// Writes the run report and prints the summary
fn finish(kind: RunKind, summary: &RunSummary, config: &Config) -> anyhow::Result<()> {
    let report_dir = Path::new(&config.output.report_dir);
    let paths = write_run_report(kind, summary, report_dir)
        .with_context(|| format!("failed to write run report to {}", report_dir.display()))?;

    print_summary(kind, summary);
    println!("\nReport: {}", paths.text.display());

    Ok(())
}

/// Handles the check mode: shows what would be crawled
fn handle_check(config: &Config) {
    println!("=== Shelfwalk Check ===\n");

    println!("Crawler Configuration:");
    println!("  Max items per unit: {}", config.crawler.max_items);
    println!("  Max subcategories: {}", config.crawler.max_subcategories);
    println!("  Max pages per unit: {}", config.crawler.max_pages);
    println!(
        "  Image retries: {} (backoff {}ms)",
        config.crawler.image_retries, config.crawler.image_backoff_ms
    );

    println!("\nPoliteness (ms):");
    for (label, range) in [
        ("item", config.politeness.item),
        ("page", config.politeness.page),
        ("unit", config.politeness.unit),
        ("category", config.politeness.category),
    ] {
        println!("  {:<9} {}-{}", label, range.min_ms, range.max_ms);
    }

    println!("\nTransport:");
    println!("  User agent: {}", config.transport.user_agent);
    println!(
        "  Timeouts: page {}s, image {}s",
        config.transport.page_timeout_secs, config.transport.image_timeout_secs
    );

    println!("\nOutput:");
    println!("  Data: {}", config.output.data_dir);
    println!("  Snapshot file: {}", config.output.snapshot_filename);
    println!("  Reports: {}", config.output.report_dir);

    println!("\nSource Domains ({}):", config.source.domains.len());
    for domain in &config.source.domains {
        println!("  - {}", domain);
    }
    println!("  Default category: {}", config.source.default_category);

    println!("\nBatch Categories ({}):", config.categories.len());
    for entry in &config.categories {
        let marker = if is_source_url(&entry.url, &config.source.domains) {
            ""
        } else {
            " (not on a source domain, will be skipped)"
        };
        println!("  - {}: {}{}", entry.name, entry.url, marker);
    }

    println!("\n✓ Configuration is valid");
}
