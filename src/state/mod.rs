//! Run state owned by the orchestrator
//!
//! - [`FrontierState`]: which URLs were discovered, fetched, failed or queued
//! - [`Corpus`]: the text of every fetched page, tagged with its URL
//! - [`AnswerLedger`]: the authoritative question -> answer mapping

mod corpus;
mod frontier;
mod ledger;

pub use corpus::{truncate_chars, Corpus, CorpusEntry};
pub use frontier::{FrontierState, QueuedUrl};
pub use ledger::{Answer, AnswerLedger, AnswerSource, LedgerError, Refinement, SetOutcome};
