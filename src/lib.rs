//! Prospector: an evidence-gathering agent for a single website
//!
//! This crate answers a fixed set of questions about one allow-listed site. It
//! crawls the site breadth-first, asks a judgment oracle which links and pages
//! matter, and escalates through pattern matching, corpus inference and web
//! search when crawling alone is not enough. Fetched pages are cached on disk so
//! reruns are cheap and deterministic.

pub mod config;
pub mod crawler;
pub mod oracle;
pub mod orchestrator;
pub mod output;
pub mod questions;
pub mod search;
pub mod state;
pub mod storage;
pub mod strategy;
pub mod testing;
pub mod url;

use thiserror::Error;

/// Main error type for Prospector operations
#[derive(Debug, Error)]
pub enum ProspectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Question set error: {0}")]
    Questions(#[from] questions::QuestionSetError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] oracle::OracleError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] state::LedgerError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("URL outside the allowed domain: {0}")]
    OutOfScope(String),
}

/// Result type alias for Prospector operations
pub type Result<T> = std::result::Result<T, ProspectorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use orchestrator::{Orchestrator, Tier};
pub use questions::{load_questions, Question};
pub use state::{Answer, AnswerLedger, AnswerSource, Corpus, FrontierState};
pub use url::SiteScope;
