//! Output module for run reports
//!
//! This module handles:
//! - The run report produced when the orchestrator reaches `DONE`
//! - Report sinks (JSON answer map, markdown summary)
//! - Console output of reports and stored statistics

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::JsonAnswerSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownSummarySink};
pub use stats::{load_statistics, print_statistics, StoredStatistics};
pub use traits::{OutputError, OutputResult, ReportSink, RunReport, RunStats};

/// Prints a run report to stdout
pub fn print_report(report: &RunReport) {
    println!("=== Prospector Report ===\n");

    let tiers: Vec<String> = report.tiers_run.iter().map(|t| t.to_string()).collect();
    println!("Tiers: {}", tiers.join(" -> "));
    println!(
        "Answered: {} / {}",
        report.answers.len(),
        report.total_questions()
    );
    println!();

    for answer in &report.answers {
        println!("  {}: {}", answer.question_id, answer.text);
        println!("      source: {} ({})", answer.source, answer.tier);
    }

    if !report.unanswered.is_empty() {
        println!();
        println!("Unanswered: {}", report.unanswered.join(", "));
    }

    let stats = &report.stats;
    println!();
    println!(
        "Fetched {} pages ({} from cache, {} failed), {} oracle calls, {} search queries",
        stats.pages_fetched,
        stats.cache_hits,
        stats.fetch_failures,
        stats.oracle_calls,
        stats.search_queries
    );
}
