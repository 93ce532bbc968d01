//! Configuration module for Prospector
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use prospector::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("prospector.toml")).unwrap();
//! println!("Crawl depth: {}", config.agent.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AgentConfig, Config, OracleConfig, OutputConfig, QuestionsConfig, SearchConfig, SiteConfig,
    StaticAnswer, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, resolve_api_key};
