//! Orchestrator for the evidence-gathering waterfall
//!
//! This module coordinates one run:
//! - Tier sequencing from `INIT` to `DONE`
//! - Crawl budgets and request pacing
//! - Routing strategy results into the frontier, corpus and answer ledger

mod budget;
mod coordinator;
mod tier;

pub use budget::{Allowance, Budget, FALLBACK_LINKS, MAX_PATTERN_CANDIDATES, MAX_RANKED_LINKS};
pub use coordinator::{Collaborators, Orchestrator};
pub use tier::Tier;
