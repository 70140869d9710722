//! Markup extraction for catalog pages
//!
//! This module handles parsing catalog markup to extract:
//! - Item links from listing pages (identifier + detail URL)
//! - Item fields from detail pages
//! - Subcategory links from category pages
//! - The next-page link of a paginated listing

use crate::crawler::resolver::SubcategoryMap;
use crate::model::ItemFields;
use crate::naming::safe_key;
use crate::url::{resolve_href, strip_query};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Targets that are never subcategories (matched in hrefs and labels)
const NEGATIVE_TERMS: &[&str] = &[
    "cart",
    "account",
    "sign-in",
    "help",
    "wishlist",
    "gift-cards",
    "prime",
    "bestsellers",
];

/// URL fragments of listing, search and browse pages
const LISTING_SHAPES: &[&str] = &["/s?", "/b?", "i="];

/// Labels too generic to name a subcategory
const GENERIC_LABELS: &[&str] = &["see all", "all", "tout", "voir plus"];

const MIN_LABEL_CHARS: usize = 4;
const MAX_LABEL_CHARS: usize = 59;

/// An item found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub identifier: String,
    pub url: Url,
}

/// Pulls structured data out of catalog markup
pub trait MarkupExtractor: Send + Sync {
    /// Item links of a listing page, in page order
    fn listing_links(&self, markup: &str, page_url: &Url) -> Vec<ListingLink>;

    /// Fields of an item detail page
    fn item_fields(&self, markup: &str, page_url: &Url) -> ItemFields;

    /// Link to the next listing page, if any
    fn next_page_url(&self, markup: &str, page_url: &Url) -> Option<Url>;
}

/// Extractor for the catalog's standard page layout
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogExtractor;

impl MarkupExtractor for CatalogExtractor {
    /// Item containers are `div[data-asin]`, falling back to search-result
    /// components when a page has none. Containers without an identifier or
    /// without a detail anchor are skipped; detail URLs lose their query.
    fn listing_links(&self, markup: &str, page_url: &Url) -> Vec<ListingLink> {
        let document = Html::parse_document(markup);

        let mut containers = select_all(&document, "div[data-asin]");
        if containers.is_empty() {
            containers = select_all(&document, "[data-component-type='s-search-result']");
        }

        let Some(anchor_selector) = selector("a[href*='/dp/'], a[href*='/gp/']") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for container in containers {
            let identifier = match container.value().attr("data-asin").map(str::trim) {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };

            let Some(href) = container
                .select(&anchor_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };

            let href = href.split('?').next().unwrap_or_default();
            let Some(url) = resolve_href(href, page_url).map(strip_query) else {
                continue;
            };

            if seen.insert(identifier.to_string()) {
                links.push(ListingLink {
                    identifier: identifier.to_string(),
                    url,
                });
            }
        }

        links
    }

    fn item_fields(&self, markup: &str, page_url: &Url) -> ItemFields {
        let document = Html::parse_document(markup);

        ItemFields {
            name: first_text(
                &document,
                &["#productTitle", "#title", "span#title", "h1.a-size-large"],
            ),
            description: description(&document),
            price: first_text(
                &document,
                &[
                    "#priceblock_ourprice",
                    "#priceblock_dealprice",
                    ".a-price .a-offscreen",
                    ".a-price-whole",
                ],
            ),
            brand: brand(&document),
            seller: first_text(&document, &["#sellerProfileTriggerId", "#merchant-info"]),
            color: first_element(
                &document,
                &["#variation_color_name .selection", ".swatchSelected"],
            )
            .map(|el| joined_text(el, ""))
            .filter(|t| !t.is_empty()),
            image_url: image_url(&document, page_url),
        }
    }

    fn next_page_url(&self, markup: &str, page_url: &Url) -> Option<Url> {
        let document = Html::parse_document(markup);
        let anchor = first_element(&document, &["a.s-pagination-next[href]"])?;
        let next = resolve_href(anchor.value().attr("href")?, page_url)?;

        (next != *page_url).then_some(next)
    }
}

/// Subcategory heuristic over listing, search and browse anchors
///
/// Keeps anchors whose href has a listing shape, skipping negative-list
/// targets and labels, labels outside 4..=59 characters and generic labels.
/// Keys are normalized labels; the first occurrence of a key wins.
pub fn listing_anchor_subcategories(markup: &str, base: &Url, max: usize) -> SubcategoryMap {
    let document = Html::parse_document(markup);
    let mut links = SubcategoryMap::new();

    for anchor in select_all(&document, "a[href]") {
        if links.len() >= max {
            break;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let label = joined_text(anchor, " ");
        if label.is_empty() {
            continue;
        }

        let href_lower = href.to_lowercase();
        if NEGATIVE_TERMS.iter().any(|term| href_lower.contains(term)) || is_negative_label(&label)
        {
            continue;
        }

        if !LISTING_SHAPES.iter().any(|shape| href.contains(shape)) {
            continue;
        }

        let length = label.chars().count();
        if !(MIN_LABEL_CHARS..=MAX_LABEL_CHARS).contains(&length)
            || GENERIC_LABELS.contains(&label.to_lowercase().as_str())
        {
            continue;
        }

        if let Some(url) = resolve_href(href, base) {
            links.insert_first(safe_key(&label), url.to_string());
        }
    }

    links
}

/// Looser heuristic: every labelled `a.a-link-normal` anchor
pub fn link_class_subcategories(markup: &str, base: &Url, max: usize) -> SubcategoryMap {
    let document = Html::parse_document(markup);
    let mut links = SubcategoryMap::new();

    for anchor in select_all(&document, "a.a-link-normal[href]") {
        if links.len() >= max {
            break;
        }

        let label = joined_text(anchor, " ");
        if label.is_empty() {
            continue;
        }

        let resolved = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, base));
        if let Some(url) = resolved {
            links.insert_first(safe_key(&label), url.to_string());
        }
    }

    links
}

/// Matches negative terms as whole words of the label
fn is_negative_label(label: &str) -> bool {
    let slug = label
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    NEGATIVE_TERMS.iter().any(|term| {
        slug == *term
            || slug.starts_with(&format!("{}-", term))
            || slug.ends_with(&format!("-{}", term))
            || slug.contains(&format!("-{}-", term))
    })
}

fn description(document: &Html) -> Option<String> {
    let node = first_element(document, &["#productDescription", "#feature-bullets"])?;

    let bullets: Vec<String> = selector("li")
        .map(|li| {
            node.select(&li)
                .map(|el| joined_text(el, ""))
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let text = if bullets.is_empty() {
        joined_text(node, " ")
    } else {
        bullets.join(" ")
    };

    Some(text).filter(|t| !t.is_empty())
}

/// Byline first, then a "Brand"/"Marque" row of the detail tables
fn brand(document: &Html) -> Option<String> {
    if let Some(byline) = first_text(document, &["#bylineInfo"]) {
        return Some(byline);
    }

    select_all(
        document,
        "#detailBullets_feature_div li, #productDetails_techSpec_section_1 tr",
    )
    .into_iter()
    .map(|row| joined_text(row, " "))
    .find(|text| text.contains("Marque") || text.contains("Brand"))
    .map(|text| match text.split_once(':') {
        Some((_, value)) => value.trim().to_string(),
        None => text.trim().to_string(),
    })
}

fn image_url(document: &Html, page_url: &Url) -> Option<String> {
    let image = first_element(
        document,
        &["#landingImage", "#imgTagWrapperId img", "img#main-image"],
    )?;

    let raw = ["data-old-hires", "data-src", "src"]
        .iter()
        .filter_map(|attr| image.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())?;

    resolve_href(raw, page_url).map(|url| url.to_string())
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// First element matching any of the selectors, tried in order
fn first_element<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| document.select(&sel).next())
}

/// Text of the first element, among the selectors in order, with any text
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|css| selector(css))
        .filter_map(|sel| document.select(&sel).next().map(|el| joined_text(el, " ")))
        .find(|text| !text.is_empty())
}

/// Text nodes of an element, whitespace-collapsed, joined by `separator`
fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
