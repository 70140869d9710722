use crate::config::types::{
    CategoryEntry, Config, CrawlerConfig, DelayRange, OutputConfig, PolitenessConfig,
    SourceConfig, TransportConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on image download retries
const MAX_IMAGE_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_politeness_config(&config.politeness)?;
    validate_transport_config(&config.transport)?;
    validate_output_config(&config.output)?;
    validate_source_config(&config.source)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawl caps
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.max_subcategories < 1 {
        return Err(ConfigError::Validation(format!(
            "max_subcategories must be >= 1, got {}",
            config.max_subcategories
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.image_retries > MAX_IMAGE_RETRIES {
        return Err(ConfigError::Validation(format!(
            "image_retries must be <= {}, got {}",
            MAX_IMAGE_RETRIES, config.image_retries
        )));
    }

    Ok(())
}

fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    validate_delay_range("item", &config.item)?;
    validate_delay_range("page", &config.page)?;
    validate_delay_range("unit", &config.unit)?;
    validate_delay_range("category", &config.category)?;
    Ok(())
}

fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} delay min-ms ({}) must not exceed max-ms ({})",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.page_timeout_secs < 1 || config.image_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got page={}s image={}s",
            config.page_timeout_secs, config.image_timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.report_dir.is_empty() {
        return Err(ConfigError::Validation(
            "report_dir cannot be empty".to_string(),
        ));
    }

    let name = &config.snapshot_filename;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".."
    {
        return Err(ConfigError::Validation(format!(
            "snapshot_filename must be a plain file name, got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source domain is required".to_string(),
        ));
    }

    for pattern in &config.domains {
        validate_domain_pattern(pattern)?;
    }

    validate_http_url("default-category", &config.default_category)
}

/// Validates batch categories: non-empty unique names, http(s) URLs
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in categories {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name '{}'",
                entry.name
            )));
        }

        validate_http_url(&entry.name, &entry.url)?;
    }

    Ok(())
}

fn validate_http_url(label: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} URL '{}': {}", label, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} URL '{}' must use http or https",
            label, raw
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
