use url::Url;

/// Resolves an href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// Protocol-relative (`//host/path`) and root-relative hrefs are both handled
/// by `Url::join`.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}

/// Drops the query string and fragment of a URL
pub fn strip_query(mut url: Url) -> Url {
    url.set_query(None);
    url.set_fragment(None);
    url
}
