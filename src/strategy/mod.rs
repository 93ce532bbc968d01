//! Answering strategies
//!
//! Each submodule implements one way of producing answers. They are pure
//! functions plus small async helpers that take the oracle as a trait object;
//! the orchestrator decides when each one runs and folds the results into its
//! state.

pub mod classify;
pub mod inference;
pub mod page_answer;
pub mod patterns;
pub mod prioritize;
pub mod url_gen;
pub mod web_search;

pub use classify::{classify, QuestionKind};
pub use page_answer::{parse_page_answers, PAGE_MIN_ANSWER_LEN, SEARCH_MIN_ANSWER_LEN};
pub use patterns::{find_candidates, PatternCandidate};
pub use prioritize::{prioritize, RankedLink, Ranking};
