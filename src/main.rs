//! Prospector main entry point
//!
//! This is the command-line interface for the Prospector evidence-gathering agent.

use anyhow::Context;
use clap::Parser;
use prospector::config::{load_config_with_hash, Config};
use prospector::orchestrator::{Collaborators, Orchestrator};
use prospector::output::{
    load_statistics, print_report, print_statistics, JsonAnswerSink, MarkdownSummarySink,
    ReportSink,
};
use prospector::questions::load_questions;
use prospector::storage::{SqliteStorage, Storage};
use prospector::url::SiteScope;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Prospector: answers a fixed set of questions about one website
///
/// Prospector crawls a single allow-listed site breadth-first, asks a judgment
/// oracle which links and pages matter, and falls back to pattern matching,
/// corpus inference and web search for whatever the crawl leaves open.
#[derive(Parser, Debug)]
#[command(name = "prospector")]
#[command(version)]
#[command(about = "An evidence-gathering agent for a single website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and questions and show what would be run
    #[arg(long, conflicts_with_all = ["stats", "clear_cache"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "clear_cache"])]
    stats: bool,

    /// Empty the page cache and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if dotenvy::dotenv().is_ok() {
        tracing::debug!("Loaded environment from .env");
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.clear_cache {
        handle_clear_cache(&config)
    } else {
        handle_run(config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prospector=info,warn"),
            1 => EnvFilter::new("prospector=debug,info"),
            2 => EnvFilter::new("prospector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and questions without any network calls
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Prospector Dry Run ===\n");

    let scope = SiteScope::from_config(&config.site).context("invalid site configuration")?;
    let questions = load_questions(Path::new(&config.questions.path))
        .with_context(|| format!("failed to load questions from {}", config.questions.path))?;

    println!("Site:");
    println!("  Domain: {}", config.site.domain);
    println!("  Start URL: {}", scope.start_url());
    println!("\nSeed URLs:");
    for url in scope.seed_urls(&config.site.seed_paths) {
        println!("  * {}", url);
    }

    println!("\nBudgets:");
    println!("  Max depth: {}", config.agent.max_depth);
    println!("  Max URLs per tier: {}", config.agent.max_urls_per_tier);
    println!(
        "  Max search queries per question: {}",
        config.agent.max_search_queries_per_question
    );
    println!("  Request delay: {}ms", config.agent.request_delay_ms);

    println!("\nOracle: {} ({})", config.oracle.model, config.oracle.endpoint);
    println!("Search: {}", config.search.endpoint);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Answers: {}", config.output.report_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nQuestions ({}):", questions.len());
    for question in &questions {
        println!("  {}: {}", question.id, question.text);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --clear-cache mode
fn handle_clear_cache(config: &Config) -> anyhow::Result<()> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let removed = storage.clear_cache()?;

    println!("✓ Removed {} cached pages", removed);
    Ok(())
}

/// Handles the main run
async fn handle_run(config: Config, config_hash: String) -> anyhow::Result<()> {
    // Questions are loaded before any network activity
    let questions = match load_questions(Path::new(&config.questions.path)) {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!("Failed to load questions: {}", e);
            return Err(e)
                .with_context(|| format!("failed to load questions from {}", config.questions.path));
        }
    };
    tracing::info!("Loaded {} questions", questions.len());

    let collaborators = Collaborators::from_config(&config)?;
    let mut orchestrator =
        Orchestrator::new(&config, questions, collaborators)?.with_config_hash(config_hash);

    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    let sinks: Vec<Box<dyn ReportSink>> = vec![
        Box::new(JsonAnswerSink::new(&config.output.report_path)),
        Box::new(MarkdownSummarySink::new(&config.output.summary_path)),
    ];
    for sink in &sinks {
        sink.submit(&report)?;
    }

    print_report(&report);
    Ok(())
}
