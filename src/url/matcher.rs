/// Checks if a host matches a wildcard domain pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "amazon.fr" matches only "amazon.fr"
/// 2. Wildcard match: "*.amazon.fr" matches:
///    - "amazon.fr" (the bare domain)
///    - "www.amazon.fr" (single subdomain)
///    - "m.www.amazon.fr" (nested subdomains)
///
/// # Examples
///
/// ```
/// use shelfwalk::url::matches_wildcard;
///
/// assert!(matches_wildcard("amazon.fr", "amazon.fr"));
/// assert!(!matches_wildcard("amazon.fr", "www.amazon.fr"));
///
/// assert!(matches_wildcard("*.amazon.fr", "amazon.fr"));
/// assert!(matches_wildcard("*.amazon.fr", "www.amazon.fr"));
/// assert!(!matches_wildcard("*.amazon.fr", "amazon.de"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if the host matches at least one of the patterns
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern.as_ref(), candidate))
}
