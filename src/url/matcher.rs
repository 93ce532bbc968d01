/// Checks if a host matches the allow-listed domain pattern
///
/// Two pattern forms are supported:
/// 1. Exact: "example.org" matches only "example.org"
/// 2. Wildcard: "*.example.org" matches "example.org" and any subdomain of it
///
/// Comparison is case-insensitive and ignores a trailing dot on the host.
///
/// # Examples
///
/// ```
/// use prospector::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.org", "EXAMPLE.org"));
/// assert!(!matches_wildcard("example.org", "www.example.org"));
/// assert!(matches_wildcard("*.example.org", "example.org"));
/// assert!(matches_wildcard("*.example.org", "api.v2.example.org"));
/// assert!(!matches_wildcard("*.example.org", "notexample.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.trim_end_matches('.').to_ascii_lowercase();

    if candidate.is_empty() {
        return false;
    }

    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}
