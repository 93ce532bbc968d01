//! Question set loading
//!
//! The question set is a JSON object mapping question ids to question texts:
//!
//! ```json
//! { "01": "What is the contact email?", "02": "Which ISO certificate does the company hold?" }
//! ```
//!
//! It is loaded once before any network activity; a missing or malformed file
//! aborts the run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// A question the agent must answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Errors raised while loading the question set
#[derive(Debug, Error)]
pub enum QuestionSetError {
    #[error("Failed to read question file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Question file is not a JSON object of id -> text: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Question set is empty")]
    Empty,

    #[error("Question '{0}' has an empty id or text")]
    Blank(String),
}

/// Loads the question set from a JSON file
///
/// Questions are returned ordered by id.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, QuestionSetError> {
    let content = std::fs::read_to_string(path).map_err(|source| QuestionSetError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_questions(&content)
}

/// Parses a question set from its JSON text
pub fn parse_questions(content: &str) -> Result<Vec<Question>, QuestionSetError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(content)?;

    if raw.is_empty() {
        return Err(QuestionSetError::Empty);
    }

    raw.into_iter()
        .map(|(id, text)| {
            let id = id.trim().to_string();
            let text = text.trim().to_string();
            if id.is_empty() || text.is_empty() {
                Err(QuestionSetError::Blank(id))
            } else {
                Ok(Question { id, text })
            }
        })
        .collect()
}
