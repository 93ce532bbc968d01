//! Storage module for persisting agent data
//!
//! This module handles all database operations, including:
//! - The persistent page content cache that makes reruns cheap
//! - Run tracking
//! - Final answers of each run

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Represents a run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub question_count: u32,
    pub answered_count: u32,
}

/// Represents a stored answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub run_id: i64,
    pub question_id: String,
    pub answer: String,
    pub source: String,
    pub tier: String,
    pub obtained_at: String,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
