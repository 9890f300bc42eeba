//! Search term parsing and pagination helpers for list endpoints.
//!
//! Search follows the familiar "every term must match some field" rule: the
//! raw `?search=` value is split on whitespace and commas, and each term is
//! turned into an escaped `ILIKE` pattern by the repository layer.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of rows per page when a limit is requested.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Maximum number of rows per page.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Clamp a user-provided limit to `[1, max]`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Search terms
// ---------------------------------------------------------------------------

/// Split a raw search string into terms.
///
/// Terms are separated by whitespace and/or commas; empty terms are dropped.
///
/// # Examples
///
/// ```
/// use ccw_core::search::split_terms;
/// assert_eq!(split_terms("chart, daily  report"), vec!["chart", "daily", "report"]);
/// assert!(split_terms(" , ").is_empty());
/// ```
pub fn split_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a case-insensitive `contains` pattern for `ILIKE ... ESCAPE '\'`.
///
/// LIKE metacharacters in the term are escaped so they match literally.
///
/// # Examples
///
/// ```
/// use ccw_core::search::contains_pattern;
/// assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
/// ```
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
