use crate::url::matches_any;
use url::Url;

/// Path segments that never make a readable category name
const GENERIC_SEGMENTS: &[&str] = &["b", "s", "gp", "ref", "dp"];

/// Name used when nothing readable can be inferred
const FALLBACK_CATEGORY_NAME: &str = "category";

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shelfwalk::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Amazon.FR/s?k=sport").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.amazon.fr".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks that a category URL points at one of the allowed source domains
///
/// Unparseable URLs, non-HTTP schemes and URLs without a host are rejected.
pub fn is_source_url<S: AsRef<str>>(raw: &str, patterns: &[S]) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    match extract_domain(&url) {
        Some(domain) => matches_any(patterns, &domain),
        None => false,
    }
}

/// Infers a readable category name from a category URL
///
/// Preference order:
/// 1. The `k` or `q` search parameter
/// 2. The last path segment, if it is at least 4 characters, not numeric and
///    not a generic routing segment (`b`, `s`, `gp`, `ref`, `dp`)
/// 3. The first host label, without a `www.` prefix
/// 4. `"category"`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shelfwalk::url::infer_category_name;
///
/// let url = Url::parse("https://www.amazon.fr/s?k=Maison").unwrap();
/// assert_eq!(infer_category_name(&url), "Maison");
///
/// let url = Url::parse("https://www.amazon.fr/b?node=13921051").unwrap();
/// assert_eq!(infer_category_name(&url), "amazon");
/// ```
pub fn infer_category_name(url: &Url) -> String {
    let search_term = url
        .query_pairs()
        .find(|(key, _)| key == "k")
        .or_else(|| url.query_pairs().find(|(key, _)| key == "q"))
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    if let Some(term) = search_term {
        return term;
    }

    let last_segment = url
        .path()
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if last_segment.chars().count() >= 4
        && !last_segment.chars().all(|c| c.is_ascii_digit())
        && !GENERIC_SEGMENTS.contains(&last_segment.to_lowercase().as_str())
    {
        return last_segment.to_string();
    }

    if let Some(host) = url.host_str() {
        let host = host.strip_prefix("www.").unwrap_or(host);
        if let Some(label) = host.split('.').next().filter(|l| !l.is_empty()) {
            return label.to_string();
        }
    }

    FALLBACK_CATEGORY_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["*.amazon.fr".to_string()]
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/b?node=1").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_source_url_accepted() {
        assert!(is_source_url("https://www.amazon.fr/s?k=jeux", &patterns()));
        assert!(is_source_url("  https://amazon.fr/b?node=1  ", &patterns()));
    }

    #[test]
    fn test_source_url_rejected() {
        assert!(!is_source_url("https://www.example.com/s?k=jeux", &patterns()));
        assert!(!is_source_url("not a url", &patterns()));
        assert!(!is_source_url("ftp://www.amazon.fr/", &patterns()));
        assert!(!is_source_url("", &patterns()));
    }

    #[test]
    fn test_name_from_query_q() {
        let url = Url::parse("https://www.amazon.fr/s?q=velo").unwrap();
        assert_eq!(infer_category_name(&url), "velo");
    }

    #[test]
    fn test_name_prefers_k_over_q() {
        let url = Url::parse("https://www.amazon.fr/s?q=velo&k=sport").unwrap();
        assert_eq!(infer_category_name(&url), "sport");
    }

    #[test]
    fn test_name_from_path_segment() {
        let url = Url::parse("https://www.amazon.fr/gp/bestsellers/kitchen").unwrap();
        assert_eq!(infer_category_name(&url), "kitchen");
    }

    #[test]
    fn test_numeric_and_generic_segments_skipped() {
        let url = Url::parse("https://www.amazon.fr/b/12345").unwrap();
        assert_eq!(infer_category_name(&url), "amazon");

        let url = Url::parse("https://shop.example.com/dp").unwrap();
        assert_eq!(infer_category_name(&url), "shop");
    }
}
