use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields extracted from an item detail page
///
/// Everything is optional here; [`ItemRecord::new`] decides whether the
/// extraction is good enough to become a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub brand: Option<String>,
    pub seller: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// Why an item did not become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("item has no identifier")]
    MissingIdentifier,

    #[error("item page has no name")]
    MissingName,

    #[error("item page fetch failed: {0}")]
    Fetch(String),
}

/// One scraped catalog item
///
/// `identifier` and `name` are never empty. The scrape timestamp is fixed at
/// construction; the only later mutation allowed is recording where the item
/// image was stored, once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    identifier: String,
    name: String,
    description: Option<String>,
    price: Option<String>,
    source_url: String,
    collection: String,
    brand: Option<String>,
    seller: Option<String>,
    color: Option<String>,
    image_url: Option<String>,
    image_local: Option<String>,
    scraped_at: DateTime<Utc>,
}

impl ItemRecord {
    /// Builds a record from extracted fields
    ///
    /// # Returns
    ///
    /// * `Ok(ItemRecord)` - identifier and name are both present
    /// * `Err(SkipReason)` - the item must be discarded
    pub fn new(
        identifier: &str,
        source_url: &str,
        collection: &str,
        fields: ItemFields,
    ) -> Result<Self, SkipReason> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(SkipReason::MissingIdentifier);
        }

        let name = fields
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(SkipReason::MissingName)?;

        Ok(Self {
            identifier: identifier.to_string(),
            name,
            description: fields.description,
            price: fields.price,
            source_url: source_url.to_string(),
            collection: collection.to_string(),
            brand: fields.brand,
            seller: fields.seller,
            color: fields.color,
            image_url: fields.image_url,
            image_local: None,
            scraped_at: Utc::now(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn seller(&self) -> Option<&str> {
        self.seller.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn image_local(&self) -> Option<&str> {
        self.image_local.as_deref()
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    /// Records where the item image was stored
    ///
    /// Returns false (and keeps the existing path) if a path was already set.
    pub fn set_image_local(&mut self, path: impl Into<String>) -> bool {
        if self.image_local.is_some() {
            return false;
        }
        self.image_local = Some(path.into());
        true
    }
}
