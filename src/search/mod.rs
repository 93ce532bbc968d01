//! Web search interface
//!
//! Used only by the last fallback tier. A search may be scoped to the site's
//! domain or left unscoped.

mod tavily;

pub use tavily::TavilySearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Network(String),

    #[error("Search API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Runs a query, restricted to `domain_scope` when given
    async fn search(
        &self,
        query: &str,
        domain_scope: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
