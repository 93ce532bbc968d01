//! Report types and the sink trait
//!
//! This module defines the run report handed to sinks at the end of a run and
//! the trait interface sinks implement.

use crate::orchestrator::Tier;
use crate::state::{Answer, Refinement};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Counters collected while a run executes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Pages fetched over the network
    pub pages_fetched: u64,

    /// Pages served from the content cache
    pub cache_hits: u64,

    /// Fetches that failed
    pub fetch_failures: u64,

    /// New in-site links found across all pages
    pub links_discovered: u64,

    pub oracle_calls: u64,
    pub oracle_failures: u64,

    /// Rankings that fell back to discovery order
    pub ranking_fallbacks: u64,

    pub search_queries: u64,
    pub corpus_pages: u64,
    pub corpus_chars: u64,
    pub duration_ms: u64,
}

/// Terminal output of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Database id of the run, if it was recorded
    pub run_id: Option<i64>,

    /// Final answers, ordered by question id
    pub answers: Vec<Answer>,

    /// Ids of questions left without an answer, sorted
    pub unanswered: Vec<String>,

    /// Tiers entered, in order
    pub tiers_run: Vec<Tier>,

    pub refinements: Vec<Refinement>,

    pub stats: RunStats,
}

impl RunReport {
    /// The `{questionId: answerText}` map
    pub fn answer_map(&self) -> BTreeMap<String, String> {
        self.answers
            .iter()
            .map(|a| (a.question_id.clone(), a.text.clone()))
            .collect()
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn is_complete(&self) -> bool {
        self.unanswered.is_empty()
    }

    pub fn total_questions(&self) -> usize {
        self.answers.len() + self.unanswered.len()
    }
}

/// Trait for report sinks
///
/// A sink receives the final report once, after the orchestrator reaches
/// `DONE`.
pub trait ReportSink {
    fn submit(&self, report: &RunReport) -> OutputResult<()>;
}
