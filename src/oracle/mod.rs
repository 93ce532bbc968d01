//! Judgment oracle interface
//!
//! Every judgment call in the agent (ranking links, reading pages, picking a
//! pattern candidate, inferring an answer, suggesting paths) goes through the
//! [`JudgmentOracle`] trait. Replies are free text and are treated as
//! unreliable: each caller parses them strictly and falls back when parsing
//! fails.

mod client;
mod protocol;

pub use client::ChatCompletionsOracle;
pub use protocol::{strip_code_fence, ParseError, CANNOT_INFER, NOT_FOUND};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors raised by an oracle call itself, as opposed to its reply
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Network(String),

    #[error("Oracle timed out")]
    Timeout,

    #[error("Oracle API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Oracle returned no content")]
    EmptyResponse,
}

/// The judgment a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleTask {
    RankLinks,
    ExtractAnswers,
    AdjudicatePattern,
    InferAnswer,
    SuggestPaths,
}

impl fmt::Display for OracleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RankLinks => "rank-links",
            Self::ExtractAnswers => "extract-answers",
            Self::AdjudicatePattern => "adjudicate-pattern",
            Self::InferAnswer => "infer-answer",
            Self::SuggestPaths => "suggest-paths",
        };
        f.write_str(name)
    }
}

/// One oracle call: instructions plus the documents they refer to
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub task: OracleTask,
    pub prompt: String,
    pub documents: Vec<String>,
}

impl OracleRequest {
    pub fn new(task: OracleTask, prompt: impl Into<String>) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.documents.push(document.into());
        self
    }
}

/// A text-in, text-out judgment service
#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    async fn judge(&self, request: &OracleRequest) -> Result<String, OracleError>;
}
