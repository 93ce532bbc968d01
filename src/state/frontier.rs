//! Crawl frontier bookkeeping
//!
//! Invariants kept by [`FrontierState`]:
//! - a URL enters the queue at most once per run
//! - the queue never holds a URL that was fetched or failed
//! - the queue is ordered by depth (ascending), then score (descending), then
//!   insertion order, so popping from the front walks the site breadth-first

use std::collections::HashSet;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    pub url: String,

    /// Crawl level; seeds are depth 0
    pub depth: u32,

    /// Relevance score from the prioritizer (higher is better)
    pub score: u8,
}

/// Discovered, fetched, failed and queued URLs of one run
#[derive(Debug, Default)]
pub struct FrontierState {
    seen: HashSet<String>,
    discovery_order: Vec<String>,
    fetched: HashSet<String>,
    failed: HashSet<String>,
    ever_queued: HashSet<String>,
    queue: Vec<QueuedUrl>,
}

impl FrontierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL as discovered
    ///
    /// Returns true if the URL had not been seen before.
    pub fn mark_seen(&mut self, url: &str) -> bool {
        if self.seen.insert(url.to_string()) {
            self.discovery_order.push(url.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Adds a URL to the queue
    ///
    /// Returns false (and leaves the queue untouched) if the URL was already
    /// fetched, already failed, or has been queued before.
    pub fn enqueue(&mut self, url: &str, depth: u32, score: u8) -> bool {
        if self.is_done(url) || self.ever_queued.contains(url) {
            return false;
        }

        self.mark_seen(url);
        self.ever_queued.insert(url.to_string());

        let position = self
            .queue
            .iter()
            .position(|queued| {
                queued.depth > depth || (queued.depth == depth && queued.score < score)
            })
            .unwrap_or(self.queue.len());

        self.queue.insert(
            position,
            QueuedUrl {
                url: url.to_string(),
                depth,
                score,
            },
        );
        true
    }

    /// Removes and returns the next URL to fetch
    pub fn pop_next(&mut self) -> Option<QueuedUrl> {
        if self.queue.is_empty() {
            None
        } else {
            Some(self.queue.remove(0))
        }
    }

    /// Records that a URL's content was retrieved
    pub fn mark_fetched(&mut self, url: &str) {
        self.mark_seen(url);
        self.fetched.insert(url.to_string());
        self.queue.retain(|queued| queued.url != url);
    }

    /// Records that fetching a URL failed; it will not be attempted again
    pub fn mark_failed(&mut self, url: &str) {
        self.mark_seen(url);
        self.failed.insert(url.to_string());
        self.queue.retain(|queued| queued.url != url);
    }

    pub fn is_fetched(&self, url: &str) -> bool {
        self.fetched.contains(url)
    }

    /// Returns true if the URL was fetched or failed
    pub fn is_done(&self, url: &str) -> bool {
        self.fetched.contains(url) || self.failed.contains(url)
    }

    /// URLs that were discovered but never queued or attempted, in discovery order
    pub fn unvisited(&self) -> Vec<String> {
        self.discovery_order
            .iter()
            .filter(|url| !self.is_done(url) && !self.ever_queued.contains(*url))
            .cloned()
            .collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Fetched URLs in discovery order
    pub fn fetched_urls(&self) -> Vec<String> {
        self.discovery_order
            .iter()
            .filter(|url| self.fetched.contains(*url))
            .cloned()
            .collect()
    }

    /// Snapshot of the queue in pop order
    pub fn queued(&self) -> &[QueuedUrl] {
        &self.queue
    }
}
