use crate::strategy::QuestionKind;
use serde::Deserialize;

/// Main configuration structure for Prospector
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    pub questions: QuestionsConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub oracle: OracleConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "static-answer")]
    pub static_answers: Vec<StaticAnswer>,
}

/// The single site the agent is allowed to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Allow-listed domain pattern (e.g., "example.org" or "*.example.org")
    pub domain: String,

    /// First page of the crawl
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Known-likely pages fetched together with the start URL
    #[serde(default, rename = "seed-paths")]
    pub seed_paths: Vec<String>,
}

/// Budgets and limits for the evidence-gathering run
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Deepest crawl level below the seed pages
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of URLs fetched by a single tier
    #[serde(default = "default_max_urls_per_tier", rename = "max-urls-per-tier")]
    pub max_urls_per_tier: u32,

    /// Maximum number of search queries issued for one question
    #[serde(
        default = "default_max_search_queries",
        rename = "max-search-queries-per-question"
    )]
    pub max_search_queries_per_question: u32,

    /// Pause between sequential network calls (milliseconds)
    #[serde(default = "default_request_delay", rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Upper bound on the text kept in the corpus
    #[serde(default = "default_corpus_max_chars", rename = "corpus-max-chars")]
    pub corpus_max_chars: usize,

    /// Upper bound on the text kept for one page
    #[serde(default = "default_page_max_chars", rename = "page-max-chars")]
    pub page_max_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_urls_per_tier: default_max_urls_per_tier(),
            max_search_queries_per_question: default_max_search_queries(),
            request_delay_ms: default_request_delay(),
            corpus_max_chars: default_corpus_max_chars(),
            page_max_chars: default_page_max_chars(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_urls_per_tier() -> u32 {
    25
}

fn default_max_search_queries() -> u32 {
    4
}

fn default_request_delay() -> u64 {
    1000
}

fn default_corpus_max_chars() -> usize {
    200_000
}

fn default_page_max_chars() -> usize {
    20_000
}

/// Location of the question set
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsConfig {
    /// Path to a JSON object mapping question ids to question texts
    pub path: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the agent
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the agent
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the agent
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for agent-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Judgment oracle endpoint (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the API, without the `/chat/completions` suffix
    pub endpoint: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(default = "default_oracle_timeout", rename = "timeout-secs")]
    pub timeout_secs: u64,
}

fn default_oracle_timeout() -> u64 {
    60
}

/// Web search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(default = "default_max_results", rename = "max-results")]
    pub max_results: u32,

    #[serde(default = "default_search_timeout", rename = "timeout-secs")]
    pub timeout_secs: u64,
}

fn default_max_results() -> u32 {
    5
}

fn default_search_timeout() -> u64 {
    30
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding the page cache and run records
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON answer map
    #[serde(rename = "report-path")]
    pub report_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// A well-known answer used before asking the oracle to infer one
#[derive(Debug, Clone, Deserialize)]
pub struct StaticAnswer {
    /// Restricts the entry to one question kind
    #[serde(default)]
    pub kind: Option<QuestionKind>,

    /// All keywords must occur in the question text (case-insensitive)
    pub keywords: Vec<String>,

    pub answer: String,
}
