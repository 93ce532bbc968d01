//! URL handling module for Prospector
//!
//! The agent works inside one allow-listed site. [`SiteScope`] owns that
//! decision: it resolves link targets against a base URL and rejects anything
//! that would leave the site.

mod matcher;

use crate::config::SiteConfig;
use crate::{UrlError, UrlResult};
use url::Url;

pub use matcher::matches_wildcard;

/// File extensions that never carry answerable text
const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp", ".css", ".js", ".mjs",
    ".woff", ".woff2", ".ttf", ".eot", ".zip", ".gz", ".tar", ".rar", ".7z", ".mp3", ".mp4",
    ".avi", ".mov", ".webm",
];

/// The allow-listed site a run is confined to
#[derive(Debug, Clone)]
pub struct SiteScope {
    pattern: String,
    start_url: Url,
}

impl SiteScope {
    /// Creates a scope from a domain pattern and the crawl's start URL
    ///
    /// Fails if the start URL cannot be parsed or lies outside the pattern.
    pub fn new(pattern: &str, start_url: &str) -> UrlResult<Self> {
        let start = Url::parse(start_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        if start.scheme() != "http" && start.scheme() != "https" {
            return Err(UrlError::InvalidScheme(start.scheme().to_string()));
        }

        let host = start.host_str().ok_or(UrlError::MissingDomain)?;
        if !matches_wildcard(pattern, host) {
            return Err(UrlError::OutOfScope(start_url.to_string()));
        }

        Ok(Self {
            pattern: pattern.to_ascii_lowercase(),
            start_url: start,
        })
    }

    pub fn from_config(config: &SiteConfig) -> UrlResult<Self> {
        Self::new(&config.domain, &config.start_url)
    }

    /// The bare domain, without a wildcard prefix
    ///
    /// Used to scope web searches to the site.
    pub fn domain(&self) -> &str {
        self.pattern.strip_prefix("*.").unwrap_or(&self.pattern)
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Returns true if the URL is HTTP(S) and its host is inside the scope
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        url.host_str()
            .map(|host| matches_wildcard(&self.pattern, host))
            .unwrap_or(false)
    }

    /// Resolves a link target against a base URL
    ///
    /// Returns None for targets that should never be crawled:
    /// - `javascript:`, `mailto:`, `tel:` and `data:` links
    /// - fragment-only links
    /// - static assets (images, stylesheets, scripts, fonts, archives, media)
    /// - anything outside the scope
    ///
    /// The fragment of the resolved URL is dropped.
    pub fn resolve(&self, target: &str, base: &Url) -> Option<Url> {
        let target = target.trim();

        if target.is_empty() || target.starts_with('#') {
            return None;
        }

        let lowered = target.to_ascii_lowercase();
        if lowered.starts_with("javascript:")
            || lowered.starts_with("mailto:")
            || lowered.starts_with("tel:")
            || lowered.starts_with("data:")
        {
            return None;
        }

        let mut resolved = base.join(target).ok()?;
        resolved.set_fragment(None);

        let path = resolved.path().to_ascii_lowercase();
        if ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return None;
        }

        if self.contains(&resolved) {
            Some(resolved)
        } else {
            None
        }
    }

    /// Builds the seed URL list: the start URL followed by each seed path
    ///
    /// Seed paths may be absolute paths ("/kontakt") or absolute in-scope URLs.
    /// Duplicates and out-of-scope entries are dropped.
    pub fn seed_urls(&self, seed_paths: &[String]) -> Vec<String> {
        let mut seeds = vec![self.start_url.to_string()];

        for path in seed_paths {
            match self.resolve(path, &self.start_url) {
                Some(url) => {
                    let url = url.to_string();
                    if !seeds.contains(&url) {
                        seeds.push(url);
                    }
                }
                None => tracing::warn!("Ignoring seed path outside the site: {}", path),
            }
        }

        seeds
    }
}
