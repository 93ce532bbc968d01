//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a run: the
//! answers with their provenance, the questions left open, the tiers that ran
//! and the run counters.

use crate::output::traits::{OutputResult, ReportSink, RunReport};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the markdown summary to a file
pub struct MarkdownSummarySink {
    path: PathBuf,
}

impl MarkdownSummarySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for MarkdownSummarySink {
    fn submit(&self, report: &RunReport) -> OutputResult<()> {
        generate_markdown_summary(report, &self.path)
    }
}

/// Generates a markdown summary from a run report
///
/// # Arguments
///
/// * `report` - The run report
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_summary(report: &RunReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Prospector Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(run_id) = report.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!(
        "- **Answered**: {} / {}\n",
        report.answers.len(),
        report.total_questions()
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        report.stats.duration_ms as f64 / 1000.0
    ));
    let tiers: Vec<String> = report.tiers_run.iter().map(|t| t.to_string()).collect();
    md.push_str(&format!("- **Tiers**: {}\n\n", tiers.join(" → ")));

    // Answers
    md.push_str("## Answers\n\n");
    if report.answers.is_empty() {
        md.push_str("No answers were found.\n\n");
    } else {
        md.push_str("| Question | Answer | Source | Tier |\n");
        md.push_str("|----------|--------|--------|------|\n");
        for answer in &report.answers {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                answer.question_id,
                escape_cell(&answer.text),
                escape_cell(&answer.source.to_string()),
                answer.tier
            ));
        }
        md.push('\n');
    }

    // Unanswered
    if !report.unanswered.is_empty() {
        md.push_str("## Unanswered Questions\n\n");
        for id in &report.unanswered {
            md.push_str(&format!("- {}\n", id));
        }
        md.push('\n');
    }

    // Refinements
    if !report.refinements.is_empty() {
        md.push_str("## Refinements\n\n");
        for refinement in &report.refinements {
            md.push_str(&format!(
                "- **{}**: {} → {} ({})\n",
                refinement.question_id,
                refinement.previous.text,
                refinement.replacement.text,
                refinement.reason
            ));
        }
        md.push('\n');
    }

    // Counters
    let stats = &report.stats;
    md.push_str("## Statistics\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Pages fetched | {} |\n", stats.pages_fetched));
    md.push_str(&format!("| Cache hits | {} |\n", stats.cache_hits));
    md.push_str(&format!("| Fetch failures | {} |\n", stats.fetch_failures));
    md.push_str(&format!("| Links discovered | {} |\n", stats.links_discovered));
    md.push_str(&format!("| Oracle calls | {} |\n", stats.oracle_calls));
    md.push_str(&format!("| Oracle failures | {} |\n", stats.oracle_failures));
    md.push_str(&format!("| Ranking fallbacks | {} |\n", stats.ranking_fallbacks));
    md.push_str(&format!("| Search queries | {} |\n", stats.search_queries));
    md.push_str(&format!(
        "| Corpus | {} pages, {} chars |\n",
        stats.corpus_pages, stats.corpus_chars
    ));

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
