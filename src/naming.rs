//! Filesystem-safe keys
//!
//! Subcategory labels double as directory names and ledger tags, so every
//! label is reduced to a conservative character set before use.

/// Default maximum length of a normalized key, in characters
pub const MAX_KEY_LEN: usize = 120;

/// Key used when a label normalizes to nothing
pub const UNNAMED: &str = "unnamed";

/// Normalizes a label into a filesystem-safe key
///
/// # Normalization Steps
///
/// 1. Drop path and shell separators (`\ / : * ? " < > |`) and control whitespace
/// 2. Keep ASCII alphanumerics, Latin-1 letters, whitespace, `_ - . ,`
/// 3. Collapse whitespace runs into single underscores, trimming both ends
/// 4. Truncate to `MAX_KEY_LEN` characters, trimming trailing underscores
///
/// An empty result becomes `"unnamed"`.
///
/// # Examples
///
/// ```
/// use shelfwalk::naming::safe_key;
///
/// assert_eq!(safe_key("Téléphones & Tablettes"), "Téléphones_Tablettes");
/// assert_eq!(safe_key("a/b:c"), "abc");
/// assert_eq!(safe_key("   "), "unnamed");
/// ```
pub fn safe_key(label: &str) -> String {
    safe_key_with_len(label, MAX_KEY_LEN)
}

/// Same as [`safe_key`] with an explicit maximum length
pub fn safe_key_with_len(label: &str, max_len: usize) -> String {
    let kept: String = label
        .chars()
        .filter(|c| !is_separator(*c))
        .filter(|c| c.is_whitespace() || is_key_char(*c))
        .collect();

    let kept = kept.split_whitespace().collect::<Vec<_>>().join("_");

    let mut key = if kept.chars().count() > max_len {
        let truncated: String = kept.chars().take(max_len).collect();
        truncated.trim_end_matches('_').to_string()
    } else {
        kept
    };

    if key.is_empty() {
        key = UNNAMED.to_string();
    }

    key
}

fn is_separator(c: char) -> bool {
    matches!(
        c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\n' | '\r' | '\t'
    )
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, ' ' | '_' | '-' | '.' | ',')
        || ('\u{C0}'..='\u{D6}').contains(&c)
        || ('\u{D8}'..='\u{F6}').contains(&c)
        || ('\u{F8}'..='\u{FF}').contains(&c)
}
