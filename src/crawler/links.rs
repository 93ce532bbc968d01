//! Link extraction from rendered page text
//!
//! Both markdown-style links (`[label](target)`) and raw `href="..."`
//! attributes are recognized, so the extractor works on rendered HTML as well
//! as on plain-text or markdown pages.

use crate::url::SiteScope;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("markdown link pattern")
});

static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("href pattern")
});

/// An in-scope link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Absolute URL, fragment removed
    pub url: String,

    /// Link label, empty for bare `href` attributes
    pub label: String,
}

/// Extracts in-scope links from page text
///
/// Relative targets are resolved against `base`. Off-site, non-HTTP and asset
/// links are dropped, and each URL is returned once, in order of first
/// appearance. Deduplication against already-seen URLs is left to the caller.
pub fn extract_links(text: &str, base: &Url, scope: &SiteScope) -> Vec<DiscoveredLink> {
    let mut found: Vec<(usize, String, String)> = Vec::new();

    for caps in MARKDOWN_LINK.captures_iter(text) {
        if let (Some(whole), Some(target)) = (caps.get(0), caps.get(2)) {
            let label = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            found.push((whole.start(), target.as_str().to_string(), label.to_string()));
        }
    }

    for caps in HREF_ATTR.captures_iter(text) {
        if let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) {
            found.push((whole.start(), target.as_str().to_string(), String::new()));
        }
    }

    found.sort_by_key(|(pos, _, _)| *pos);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for (_, target, label) in found {
        let Some(url) = scope.resolve(&target, base) else {
            tracing::trace!("Skipping link target {}", target);
            continue;
        };

        let url = url.to_string();
        if seen.insert(url.clone()) {
            links.push(DiscoveredLink { url, label });
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> SiteScope {
        SiteScope::new("example.org", "https://example.org/").unwrap()
    }

    fn base() -> Url {
        Url::parse("https://example.org/about/").unwrap()
    }

    fn urls(links: &[DiscoveredLink]) -> Vec<&str> {
        links.iter().map(|l| l.url.as_str()).collect()
    }

    #[test]
    fn test_markdown_links_with_labels() {
        let text = "See [Contact](/kontakt) and [Team](team \"Our team\").";
        let links = extract_links(text, &base(), &scope());

        assert_eq!(
            urls(&links),
            vec!["https://example.org/kontakt", "https://example.org/about/team"]
        );
        assert_eq!(links[0].label, "Contact");
        assert_eq!(links[1].label, "Team");
    }

    #[test]
    fn test_href_attributes_both_quote_styles() {
        let text = r#"<a href="/a">A</a> <a href='/b'>B</a>"#;
        let links = extract_links(text, &base(), &scope());
        assert_eq!(
            urls(&links),
            vec!["https://example.org/a", "https://example.org/b"]
        );
        assert!(links[0].label.is_empty());
    }

    #[test]
    fn test_off_domain_links_never_returned() {
        let text = "[Out](https://other.org/x) [Sub](https://cdn.example.org/y) [In](https://example.org/z)";
        let links = extract_links(text, &base(), &scope());
        assert_eq!(urls(&links), vec!["https://example.org/z"]);
    }

    #[test]
    fn test_skips_special_schemes_and_assets() {
        let text = "[Mail](mailto:a@example.org) [Call](tel:123) [Top](#top) [Logo](/logo.png) [Js](javascript:void(0))";
        assert!(extract_links(text, &base(), &scope()).is_empty());
    }

    #[test]
    fn test_dedups_within_page_and_strips_fragment() {
        let text = "[One](/page#a) [Two](/page#b) href=\"/page\"";
        let links = extract_links(text, &base(), &scope());
        assert_eq!(urls(&links), vec!["https://example.org/page"]);
        assert_eq!(links[0].label, "One");
    }

    #[test]
    fn test_wildcard_scope_accepts_subdomains() {
        let scope = SiteScope::new("*.example.org", "https://www.example.org/").unwrap();
        let text = "[Docs](https://docs.example.org/start) [Other](https://example.com/)";
        let links = extract_links(text, &base(), &scope);
        assert_eq!(urls(&links), vec!["https://docs.example.org/start"]);
    }
}
