//! Subcategory resolution
//!
//! A category page is turned into a bounded, ordered mapping of subcategory
//! key to URL by running an explicit chain of strategies. The first strategy
//! producing a non-empty mapping wins.

use crate::crawler::extract::{link_class_subcategories, listing_anchor_subcategories};
use crate::crawler::transport::TransportSession;
use url::Url;

/// Insertion-ordered map of subcategory key to URL
///
/// Keys are unique and the first insertion of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubcategoryMap {
    entries: Vec<(String, String)>,
}

impl SubcategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key unless it is already present
    ///
    /// Returns true if the entry was added.
    pub fn insert_first(&mut self, key: impl Into<String>, url: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, url.into()));
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, url)| url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries beyond `max`, keeping insertion order
    pub fn truncate(&mut self, max: usize) {
        self.entries.truncate(max);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for SubcategoryMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubcategoryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SubcategoryMap::new();
        for (key, url) in iter {
            map.insert_first(key, url);
        }
        map
    }
}

/// Markup heuristic signature: (markup, category URL, cap) to mapping
pub type MarkupHeuristic = fn(&str, &Url, usize) -> SubcategoryMap;

/// One step of the resolution chain
#[derive(Clone, Copy)]
pub enum ResolveStrategy {
    /// Ask the transport session directly
    Transport,
    /// Run a heuristic over the category page markup
    Markup {
        name: &'static str,
        heuristic: MarkupHeuristic,
    },
}

impl ResolveStrategy {
    fn name(&self) -> &'static str {
        match self {
            ResolveStrategy::Transport => "transport",
            ResolveStrategy::Markup { name, .. } => *name,
        }
    }
}

impl std::fmt::Debug for ResolveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs the strategy chain for category pages
#[derive(Debug, Clone)]
pub struct SubcategoryResolver {
    strategies: Vec<ResolveStrategy>,
}

impl Default for SubcategoryResolver {
    /// Transport first, then listing anchors, then the loose anchor-class pass
    fn default() -> Self {
        Self::new(vec![
            ResolveStrategy::Transport,
            ResolveStrategy::Markup {
                name: "listing-anchors",
                heuristic: listing_anchor_subcategories,
            },
            ResolveStrategy::Markup {
                name: "link-class",
                heuristic: link_class_subcategories,
            },
        ])
    }
}

impl SubcategoryResolver {
    pub fn new(strategies: Vec<ResolveStrategy>) -> Self {
        Self { strategies }
    }

    /// Resolves at most `max` subcategories of a category page
    ///
    /// Never fails: strategy errors are logged and the next strategy runs.
    /// The category page is fetched at most once, and only if a markup
    /// strategy is reached. An empty result tells the caller to crawl the
    /// category page itself.
    pub async fn resolve(
        &self,
        session: &mut dyn TransportSession,
        category_url: &str,
        max: usize,
    ) -> SubcategoryMap {
        if max == 0 {
            return SubcategoryMap::new();
        }

        let base = Url::parse(category_url).ok();
        let mut markup: Option<Option<String>> = None;

        for strategy in &self.strategies {
            let mut found = match strategy {
                ResolveStrategy::Transport => {
                    match session.subcategory_links(category_url, max).await {
                        Ok(map) => map,
                        Err(e) => {
                            tracing::warn!(
                                "Transport subcategory lookup failed for {}: {}",
                                category_url,
                                e
                            );
                            continue;
                        }
                    }
                }
                ResolveStrategy::Markup { heuristic, .. } => {
                    let Some(base) = base.as_ref() else {
                        continue;
                    };

                    if markup.is_none() {
                        markup = Some(match session.fetch(category_url).await {
                            Ok(page) => Some(page),
                            Err(e) => {
                                tracing::warn!(
                                    "Could not load category page {}: {}",
                                    category_url,
                                    e
                                );
                                None
                            }
                        });
                    }

                    match markup.as_ref().and_then(|m| m.as_deref()) {
                        Some(page) => heuristic(page, base, max),
                        None => continue,
                    }
                }
            };

            if !found.is_empty() {
                found.truncate(max);
                tracing::debug!(
                    "Resolved {} subcategories of {} via {}",
                    found.len(),
                    category_url,
                    strategy.name()
                );
                return found;
            }
        }

        tracing::info!("No subcategories found for {}", category_url);
        SubcategoryMap::new()
    }
}
