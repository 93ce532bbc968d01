//! Accumulated page text
//!
//! Truncation policy: each page keeps at most `page_max_chars` characters.
//! Once the corpus holds `max_chars` characters in total, later pages are
//! recorded by URL only and their text is dropped. Prompts built from the
//! corpus apply their own, smaller limit through [`Corpus::render`].

/// One fetched page in the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub url: String,
    pub text: String,

    /// True if part of the page's text was cut by the size limits
    pub truncated: bool,
}

/// Append-only collection of fetched page texts
#[derive(Debug)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    total_chars: usize,
    max_chars: usize,
    page_max_chars: usize,
}

impl Corpus {
    pub fn new(max_chars: usize, page_max_chars: usize) -> Self {
        Self {
            entries: Vec::new(),
            total_chars: 0,
            max_chars,
            page_max_chars,
        }
    }

    /// Appends a page, applying the truncation policy
    ///
    /// Returns the number of characters kept. A URL already in the corpus is
    /// not appended again.
    pub fn append(&mut self, url: &str, text: &str) -> usize {
        if self.contains(url) {
            return 0;
        }

        let remaining = self.max_chars.saturating_sub(self.total_chars);
        let limit = self.page_max_chars.min(remaining);
        let kept = truncate_chars(text, limit);
        let kept_chars = kept.chars().count();
        let truncated = kept.len() < text.len();

        if remaining == 0 {
            tracing::warn!("Corpus is full, keeping only the URL of {}", url);
        } else if truncated {
            tracing::debug!("Truncated {} to {} characters", url, kept_chars);
        }

        self.entries.push(CorpusEntry {
            url: url.to_string(),
            text: kept.to_string(),
            truncated,
        });
        self.total_chars += kept_chars;

        kept_chars
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry.url == url)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// Renders the corpus as source-tagged text, cut at `limit` characters
    pub fn render(&self, limit: usize) -> String {
        let mut rendered = String::new();

        for entry in &self.entries {
            if entry.text.is_empty() {
                continue;
            }
            rendered.push_str(&format!("### Source: {}\n{}\n\n", entry.url, entry.text));
            if rendered.chars().count() >= limit {
                break;
            }
        }

        truncate_chars(&rendered, limit).to_string()
    }
}

/// Returns the longest prefix of `text` with at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("zażółć", 3), "zaż");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_append_is_monotonic_and_deduplicated() {
        let mut corpus = Corpus::new(1000, 100);
        corpus.append("https://example.org/a", "alpha");
        corpus.append("https://example.org/b", "beta");
        assert_eq!(corpus.append("https://example.org/a", "other"), 0);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.entries()[0].text, "alpha");
        assert_eq!(corpus.total_chars(), 9);
    }

    #[test]
    fn test_page_limit_truncates() {
        let mut corpus = Corpus::new(1000, 4);
        let kept = corpus.append("https://example.org/a", "abcdefgh");
        assert_eq!(kept, 4);
        assert!(corpus.entries()[0].truncated);
        assert_eq!(corpus.entries()[0].text, "abcd");
    }

    #[test]
    fn test_full_corpus_keeps_url_only() {
        let mut corpus = Corpus::new(6, 4);
        corpus.append("https://example.org/a", "abcd");
        corpus.append("https://example.org/b", "efgh");
        corpus.append("https://example.org/c", "ijkl");

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.entries()[1].text, "ef");
        assert_eq!(corpus.entries()[2].text, "");
        assert!(corpus.entries()[2].truncated);
        assert_eq!(corpus.total_chars(), 6);
    }

    #[test]
    fn test_render_tags_sources_and_limits() {
        let mut corpus = Corpus::new(1000, 100);
        corpus.append("https://example.org/a", "alpha");
        corpus.append("https://example.org/b", "beta");

        let rendered = corpus.render(1000);
        assert!(rendered.contains("### Source: https://example.org/a\nalpha"));
        assert!(rendered.contains("### Source: https://example.org/b\nbeta"));

        assert_eq!(corpus.render(10).chars().count(), 10);
    }
}
