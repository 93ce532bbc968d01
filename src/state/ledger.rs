//! The answer ledger
//!
//! One answer per question id. An answer is never overwritten by `set`; the
//! only way to replace one is [`AnswerLedger::refine`], which is logged and
//! limited to URL-shaped answers replaced by a different URL.

use crate::orchestrator::Tier;
use crate::questions::Question;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Which component produced an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum AnswerSource {
    /// Extracted from a fetched page
    Page(String),
    /// Literal match found by the pattern battery
    Pattern,
    /// Static knowledge or oracle inference over the corpus
    Inference,
    /// Extracted from search results for the given query
    WebSearch(String),
}

impl AnswerSource {
    /// Parses the string form produced by `Display`
    pub fn from_db_string(s: &str) -> Self {
        match s {
            "pattern" => Self::Pattern,
            "inference" => Self::Inference,
            _ => match s.strip_prefix("web-search:") {
                Some(query) => Self::WebSearch(query.to_string()),
                None => Self::Page(s.to_string()),
            },
        }
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(url) => write!(f, "{}", url),
            Self::Pattern => write!(f, "pattern"),
            Self::Inference => write!(f, "inference"),
            Self::WebSearch(query) => write!(f, "web-search:{}", query),
        }
    }
}

impl From<AnswerSource> for String {
    fn from(source: AnswerSource) -> Self {
        source.to_string()
    }
}

/// An answer with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question_id: String,
    pub text: String,
    pub source: AnswerSource,
    pub tier: Tier,
    pub obtained_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(
        question_id: impl Into<String>,
        text: impl Into<String>,
        source: AnswerSource,
        tier: Tier,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            text: text.into(),
            source,
            tier,
            obtained_at: Utc::now(),
        }
    }

    /// Returns true if the answer text is an absolute HTTP(S) URL
    pub fn is_url_shaped(&self) -> bool {
        is_http_url(&self.text)
    }
}

/// A logged replacement of a provisional answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Refinement {
    pub question_id: String,
    pub previous: Answer,
    pub replacement: Answer,
    pub reason: String,
}

/// Result of [`AnswerLedger::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    /// The question already had an answer; the new one was discarded
    AlreadyAnswered,
}

/// Errors raised by ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("Question {0} has no answer to refine")]
    NotAnswered(String),

    #[error("Refinement of {question_id} not permitted: {reason}")]
    RefineNotPermitted { question_id: String, reason: String },
}

/// Authoritative question -> answer mapping for one run
#[derive(Debug, Default)]
pub struct AnswerLedger {
    question_ids: BTreeSet<String>,
    answers: BTreeMap<String, Answer>,
    refinements: Vec<Refinement>,
}

impl AnswerLedger {
    pub fn new(questions: &[Question]) -> Self {
        Self {
            question_ids: questions.iter().map(|q| q.id.clone()).collect(),
            answers: BTreeMap::new(),
            refinements: Vec::new(),
        }
    }

    /// Records the first answer for a question
    ///
    /// A question that already has an answer keeps it.
    pub fn set(&mut self, answer: Answer) -> Result<SetOutcome, LedgerError> {
        if !self.question_ids.contains(&answer.question_id) {
            return Err(LedgerError::UnknownQuestion(answer.question_id));
        }

        if let Some(existing) = self.answers.get(&answer.question_id) {
            tracing::debug!(
                question_id = %answer.question_id,
                kept = %existing.text,
                discarded = %answer.text,
                "Question already answered"
            );
            return Ok(SetOutcome::AlreadyAnswered);
        }

        tracing::info!(
            question_id = %answer.question_id,
            source = %answer.source,
            tier = %answer.tier,
            "Answer recorded: {}",
            answer.text
        );
        self.answers.insert(answer.question_id.clone(), answer);
        Ok(SetOutcome::Inserted)
    }

    /// Replaces a provisional URL answer with a more specific URL
    ///
    /// Both the existing and the new answer must be absolute HTTP(S) URLs and
    /// they must differ. The replacement is logged and kept in the refinement
    /// log.
    pub fn refine(
        &mut self,
        question_id: &str,
        replacement: Answer,
        reason: &str,
    ) -> Result<&Refinement, LedgerError> {
        if !self.question_ids.contains(question_id) {
            return Err(LedgerError::UnknownQuestion(question_id.to_string()));
        }

        let previous = self
            .answers
            .get(question_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotAnswered(question_id.to_string()))?;

        if replacement.question_id != question_id {
            return Err(LedgerError::RefineNotPermitted {
                question_id: question_id.to_string(),
                reason: format!("replacement belongs to {}", replacement.question_id),
            });
        }

        if !previous.is_url_shaped() || !replacement.is_url_shaped() {
            return Err(LedgerError::RefineNotPermitted {
                question_id: question_id.to_string(),
                reason: "only URL answers can be refined".to_string(),
            });
        }

        if previous.text == replacement.text {
            return Err(LedgerError::RefineNotPermitted {
                question_id: question_id.to_string(),
                reason: "replacement is identical".to_string(),
            });
        }

        tracing::info!(
            question_id = %question_id,
            previous = %previous.text,
            replacement = %replacement.text,
            reason = %reason,
            "Refined answer"
        );

        self.answers
            .insert(question_id.to_string(), replacement.clone());
        self.refinements.push(Refinement {
            question_id: question_id.to_string(),
            previous,
            replacement,
            reason: reason.to_string(),
        });

        Ok(&self.refinements[self.refinements.len() - 1])
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    /// Returns true once every question has an answer
    pub fn is_complete(&self) -> bool {
        self.question_ids
            .iter()
            .all(|id| self.answers.contains_key(id))
    }

    /// Questions without an answer, in the given order
    pub fn outstanding<'a>(&self, questions: &'a [Question]) -> Vec<&'a Question> {
        questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .collect()
    }

    /// Ids of questions without an answer, sorted
    pub fn unanswered_ids(&self) -> Vec<String> {
        self.question_ids
            .iter()
            .filter(|id| !self.answers.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }

    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Question id -> answer text, the payload handed to the reporting sink
    pub fn answer_map(&self) -> BTreeMap<String, String> {
        self.answers
            .iter()
            .map(|(id, answer)| (id.clone(), answer.text.clone()))
            .collect()
    }
}

/// Returns true if the text is an absolute HTTP(S) URL
pub(crate) fn is_http_url(text: &str) -> bool {
    Url::parse(text.trim())
        .map(|url| (url.scheme() == "http" || url.scheme() == "https") && url.host().is_some())
        .unwrap_or(false)
}
