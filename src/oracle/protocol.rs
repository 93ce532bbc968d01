//! Shared reply conventions
//!
//! Sentinels and helpers used by every caller that parses oracle replies.

use thiserror::Error;

/// Reply for a question the given text does not answer
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Reply for a question the oracle cannot infer
pub const CANNOT_INFER: &str = "CANNOT_INFER";

/// A reply that does not follow the requested format
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Reply is empty")]
    Empty,

    #[error("Reply is not valid JSON: {0}")]
    Json(String),

    #[error("Unexpected value in reply: {0}")]
    UnexpectedValue(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Removes a single surrounding markdown code fence, if present
///
/// ```
/// use prospector::oracle::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
/// assert_eq!(strip_code_fence("  plain  "), "plain");
/// ```
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the language tag line, if any
    match body.split_once('\n') {
        Some((tag, inner)) if !tag.trim().contains(' ') => inner.trim(),
        _ => body.trim(),
    }
}
