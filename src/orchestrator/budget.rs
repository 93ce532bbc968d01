//! Central limits consulted by every tier
//!
//! Every loop in the orchestrator is bounded by one of these counters, so a
//! run terminates even against an empty, unreachable or adversarial site.

use crate::config::AgentConfig;
use std::time::Duration;

/// Links kept by the prioritizer per page
pub const MAX_RANKED_LINKS: usize = 5;

/// Links taken in discovery order when the prioritizer's oracle fails
pub const FALLBACK_LINKS: usize = 3;

/// Candidates shown to the oracle during pattern adjudication
pub const MAX_PATTERN_CANDIDATES: usize = 5;

/// Limits for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    /// Deepest crawl level; seeds are level 0
    pub max_depth: u32,

    /// URLs fetched by one crawl tier, and URLs generated for discovery
    pub max_urls_per_tier: u32,

    /// Queries issued for one question during web search
    pub max_search_queries_per_question: u32,

    /// Pause between sequential network calls
    pub request_delay: Duration,
}

impl Budget {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_urls_per_tier: config.max_urls_per_tier,
            max_search_queries_per_question: config.max_search_queries_per_question,
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Returns true if pages at `depth` may still have their links followed
    pub fn can_expand(&self, depth: u32) -> bool {
        depth < self.max_depth
    }
}

/// Counts attempts against one cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    used: u32,
    cap: u32,
}

impl Allowance {
    pub fn new(cap: u32) -> Self {
        Self { used: 0, cap }
    }

    /// Consumes one unit; returns false once the cap is reached
    pub fn take(&mut self) -> bool {
        if self.used >= self.cap {
            false
        } else {
            self.used += 1;
            true
        }
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_from_config() {
        let budget = Budget::from_config(&AgentConfig::default());
        assert_eq!(budget.max_depth, 2);
        assert_eq!(budget.request_delay, Duration::from_millis(1000));
        assert!(budget.can_expand(1));
        assert!(!budget.can_expand(2));
    }

    #[test]
    fn test_allowance_stops_at_cap() {
        let mut allowance = Allowance::new(2);
        assert!(allowance.take());
        assert!(allowance.take());
        assert!(!allowance.take());
        assert_eq!(allowance.used(), 2);
    }

    #[test]
    fn test_zero_allowance() {
        let mut allowance = Allowance::new(0);
        assert!(!allowance.take());
        assert_eq!(allowance.used(), 0);
    }
}
