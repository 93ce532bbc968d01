//! Statistics generation from the run database
//!
//! This module provides functionality for extracting and displaying
//! what the database holds: cached pages, past runs and the answers of the
//! latest run.

use crate::output::OutputResult;
use crate::storage::{AnswerRecord, RunRecord, Storage};

/// Database statistics summary
#[derive(Debug, Clone)]
pub struct StoredStatistics {
    /// Pages in the content cache
    pub cached_pages: u64,

    /// Runs recorded
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Answers recorded by the most recent run
    pub latest_answers: Vec<AnswerRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> OutputResult<StoredStatistics> {
    let cached_pages = storage.count_cached()?;
    let total_runs = storage.count_runs()?;
    let latest_run = storage.get_latest_run()?;

    let latest_answers = match &latest_run {
        Some(run) => storage.get_answers(run.id)?,
        None => Vec::new(),
    };

    Ok(StoredStatistics {
        cached_pages,
        total_runs,
        latest_run,
        latest_answers,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoredStatistics) {
    println!("=== Prospector Statistics ===\n");

    println!("Overview:");
    println!("  Cached pages: {}", stats.cached_pages);
    println!("  Runs recorded: {}", stats.total_runs);
    println!();

    let Some(run) = &stats.latest_run else {
        println!("No runs recorded yet.");
        return;
    };

    println!("Latest Run (#{}):", run.id);
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Status: {}", run.status.to_db_string());
    println!(
        "  Answered: {} / {}",
        run.answered_count, run.question_count
    );
    println!();

    if !stats.latest_answers.is_empty() {
        println!("Answers:");
        for answer in &stats.latest_answers {
            println!(
                "  {}: {} [{} via {}]",
                answer.question_id, answer.answer, answer.tier, answer.source
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Tier;
    use crate::state::{Answer, AnswerSource};
    use crate::storage::SqliteStorage;

    #[test]
    fn test_load_statistics_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.cached_pages, 0);
        assert_eq!(stats.total_runs, 0);
        assert!(stats.latest_run.is_none());
        assert!(stats.latest_answers.is_empty());
    }

    #[test]
    fn test_load_statistics_latest_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.put_cached("https://example.org/", "home").unwrap();

        let first = storage.create_run("h", 1).unwrap();
        storage.complete_run(first, 0).unwrap();
        let second = storage.create_run("h", 1).unwrap();
        storage
            .record_answer(
                second,
                &Answer::new("01", "Gdańsk, Poland", AnswerSource::Inference, Tier::CorpusInference),
            )
            .unwrap();
        storage.complete_run(second, 1).unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.cached_pages, 1);
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.latest_run.as_ref().map(|r| r.id), Some(second));
        assert_eq!(stats.latest_answers.len(), 1);
        assert_eq!(stats.latest_answers[0].source, "inference");
    }
}
