//! States of the evidence-gathering waterfall
//!
//! ```text
//! INIT → SEED_SPECIFIC_PAGES → BFS_CRAWL → ADDITIONAL_URL_DISCOVERY
//!      → PATTERN_EXTRACTION → CORPUS_INFERENCE → WEB_SEARCH → DONE
//! ```
//!
//! States are strictly sequential; `DONE` is terminal.

use serde::Serialize;
use std::fmt;

/// One state of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Init,
    SeedSpecificPages,
    BfsCrawl,
    AdditionalUrlDiscovery,
    PatternExtraction,
    CorpusInference,
    WebSearch,
    Done,
}

impl Tier {
    /// All states in execution order
    pub const ORDER: [Tier; 8] = [
        Tier::Init,
        Tier::SeedSpecificPages,
        Tier::BfsCrawl,
        Tier::AdditionalUrlDiscovery,
        Tier::PatternExtraction,
        Tier::CorpusInference,
        Tier::WebSearch,
        Tier::Done,
    ];

    /// The state that follows this one; `Done` follows itself
    pub fn next(self) -> Tier {
        match self {
            Self::Init => Self::SeedSpecificPages,
            Self::SeedSpecificPages => Self::BfsCrawl,
            Self::BfsCrawl => Self::AdditionalUrlDiscovery,
            Self::AdditionalUrlDiscovery => Self::PatternExtraction,
            Self::PatternExtraction => Self::CorpusInference,
            Self::CorpusInference => Self::WebSearch,
            Self::WebSearch => Self::Done,
            Self::Done => Self::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Converts the tier to its database string representation
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::SeedSpecificPages => "SEED_SPECIFIC_PAGES",
            Self::BfsCrawl => "BFS_CRAWL",
            Self::AdditionalUrlDiscovery => "ADDITIONAL_URL_DISCOVERY",
            Self::PatternExtraction => "PATTERN_EXTRACTION",
            Self::CorpusInference => "CORPUS_INFERENCE",
            Self::WebSearch => "WEB_SEARCH",
            Self::Done => "DONE",
        }
    }

    /// Parses a tier from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::ORDER
            .iter()
            .copied()
            .find(|tier| tier.to_db_string() == s)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_the_waterfall_in_order() {
        let mut tier = Tier::Init;
        let mut visited = vec![tier];
        while !tier.is_terminal() {
            tier = tier.next();
            visited.push(tier);
        }
        assert_eq!(visited, Tier::ORDER.to_vec());
        assert_eq!(Tier::Done.next(), Tier::Done);
    }

    #[test]
    fn test_order_matches_ord() {
        let mut sorted = Tier::ORDER.to_vec();
        sorted.sort();
        assert_eq!(sorted, Tier::ORDER.to_vec());
    }

    #[test]
    fn test_db_string_roundtrip() {
        for tier in Tier::ORDER {
            assert_eq!(Tier::from_db_string(tier.to_db_string()), Some(tier));
        }
        assert_eq!(Tier::from_db_string("SOMETHING_ELSE"), None);
    }
}
