//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::Answer;
use crate::storage::{AnswerRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Holds the persistent content cache plus the record of each run. The
/// orchestrator owns its storage exclusively, so implementations need not be
/// thread-safe.
pub trait Storage: Send {
    // ===== Content Cache =====

    /// Looks up cached page content by the exact URL string
    fn get_cached(&self, url: &str) -> StorageResult<Option<String>>;

    /// Stores page content under the exact URL string
    ///
    /// An existing entry is never replaced, so cached content stays
    /// byte-identical across runs.
    fn put_cached(&mut self, url: &str, text: &str) -> StorageResult<()>;

    /// Counts cached pages
    fn count_cached(&self) -> StorageResult<u64>;

    /// Removes every cached page, returning how many were removed
    fn clear_cache(&mut self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `question_count` - Size of the question set
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, question_count: u32) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp and answer count
    fn complete_run(&mut self, run_id: i64, answered: u32) -> StorageResult<()>;

    /// Counts all runs
    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Answers =====

    /// Records the final answer for one question of a run
    fn record_answer(&mut self, run_id: i64, answer: &Answer) -> StorageResult<()>;

    /// Gets the answers recorded for a run, ordered by question id
    fn get_answers(&self, run_id: i64) -> StorageResult<Vec<AnswerRecord>>;
}
