//! Testing utilities including mock collaborators.
//!
//! These let the orchestrator run end to end without network access: pages
//! come from a map, oracle replies follow simple scripted rules and search
//! results are canned.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::config::{
    AgentConfig, Config, OracleConfig, OutputConfig, QuestionsConfig, SearchConfig, SiteConfig,
    UserAgentConfig,
};
use crate::crawler::{Fetch, FetchError};
use crate::oracle::{JudgmentOracle, OracleError, OracleRequest, OracleTask, CANNOT_INFER, NOT_FOUND};
use crate::search::{SearchError, SearchHit, SearchService};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fetcher serving pages from memory
///
/// Unknown URLs fail with HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `text` for the exact URL string
    pub fn with_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.insert(url.into(), text.into());
        self
    }

    /// Every URL fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        lock(&self.calls).push(url.to_string());

        self.pages.get(url).cloned().ok_or_else(|| FetchError::Http {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// A fact the scripted oracle "reads" from documents
#[derive(Debug, Clone)]
struct Fact {
    question_id: String,
    needle: String,
    answer: String,
}

/// A judgment oracle following fixed rules
///
/// - Extraction: answers a question when a document contains the fact's
///   needle, otherwise replies `NOT_FOUND`
/// - Ranking: scores every candidate, boosting URLs that contain a configured
///   fragment
/// - Pattern pick, inference and path suggestion: canned replies
///
/// Any task can be switched to fail with a timeout.
pub struct ScriptedOracle {
    facts: Vec<Fact>,
    boosts: Vec<(String, u8)>,
    default_score: u8,
    pick_reply: String,
    inference_reply: String,
    paths_reply: String,
    failing: HashSet<OracleTask>,
    calls: Mutex<Vec<OracleRequest>>,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self {
            facts: Vec::new(),
            boosts: Vec::new(),
            default_score: 6,
            pick_reply: NOT_FOUND.to_string(),
            inference_reply: CANNOT_INFER.to_string(),
            paths_reply: "[]".to_string(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `question_id` with `answer` from any document containing `needle`
    pub fn with_fact(
        mut self,
        question_id: impl Into<String>,
        needle: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        self.facts.push(Fact {
            question_id: question_id.into(),
            needle: needle.into(),
            answer: answer.into(),
        });
        self
    }

    /// Scores candidate URLs containing `fragment` with `score`
    pub fn with_boost(mut self, fragment: impl Into<String>, score: u8) -> Self {
        self.boosts.push((fragment.into(), score));
        self
    }

    /// Score given to candidates no boost applies to
    pub fn with_default_score(mut self, score: u8) -> Self {
        self.default_score = score;
        self
    }

    pub fn with_pick(mut self, reply: impl Into<String>) -> Self {
        self.pick_reply = reply.into();
        self
    }

    pub fn with_inference(mut self, reply: impl Into<String>) -> Self {
        self.inference_reply = reply.into();
        self
    }

    pub fn with_paths(mut self, reply: impl Into<String>) -> Self {
        self.paths_reply = reply.into();
        self
    }

    /// Makes every call for `task` time out
    pub fn failing(mut self, task: OracleTask) -> Self {
        self.failing.insert(task);
        self
    }

    /// Makes every call time out
    pub fn failing_all(self) -> Self {
        [
            OracleTask::RankLinks,
            OracleTask::ExtractAnswers,
            OracleTask::AdjudicatePattern,
            OracleTask::InferAnswer,
            OracleTask::SuggestPaths,
        ]
        .into_iter()
        .fold(self, |oracle, task| oracle.failing(task))
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<OracleRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, task: OracleTask) -> usize {
        lock(&self.calls).iter().filter(|r| r.task == task).count()
    }

    fn extract_reply(&self, request: &OracleRequest) -> String {
        let ids = listed_items(&request.prompt, "Questions:\n")
            .into_iter()
            .filter_map(|line| line.split_once(": ").map(|(id, _)| id.to_string()))
            .collect::<Vec<_>>();

        ids.iter()
            .map(|id| {
                let answer = self
                    .facts
                    .iter()
                    .find(|fact| {
                        &fact.question_id == id
                            && request.documents.iter().any(|d| d.contains(&fact.needle))
                    })
                    .map(|fact| fact.answer.as_str())
                    .unwrap_or(NOT_FOUND);
                format!("{}: {}", id, answer)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rank_reply(&self, request: &OracleRequest) -> String {
        let scores = listed_items(&request.prompt, "Candidates:\n")
            .into_iter()
            .filter_map(|line| line.strip_prefix("- "))
            .map(|entry| entry.split(" (label: ").next().unwrap_or(entry))
            .map(|url| {
                let score = self
                    .boosts
                    .iter()
                    .find(|(fragment, _)| url.contains(fragment.as_str()))
                    .map(|(_, score)| *score)
                    .unwrap_or(self.default_score);
                serde_json::json!({ "url": url, "score": score })
            })
            .collect::<Vec<_>>();

        serde_json::json!({ "scores": scores }).to_string()
    }
}

/// Non-empty lines following `header` in a prompt, up to the next blank line
fn listed_items<'a>(prompt: &'a str, header: &str) -> Vec<&'a str> {
    let Some((_, rest)) = prompt.split_once(header) else {
        return Vec::new();
    };
    rest.lines().take_while(|line| !line.trim().is_empty()).collect()
}

#[async_trait]
impl JudgmentOracle for ScriptedOracle {
    async fn judge(&self, request: &OracleRequest) -> Result<String, OracleError> {
        lock(&self.calls).push(request.clone());

        if self.failing.contains(&request.task) {
            return Err(OracleError::Timeout);
        }

        let reply = match request.task {
            OracleTask::ExtractAnswers => self.extract_reply(request),
            OracleTask::RankLinks => self.rank_reply(request),
            OracleTask::AdjudicatePattern => self.pick_reply.clone(),
            OracleTask::InferAnswer => self.inference_reply.clone(),
            OracleTask::SuggestPaths => self.paths_reply.clone(),
        };
        Ok(reply)
    }
}

/// A search service returning canned hits
#[derive(Default)]
pub struct MockSearch {
    results: Vec<(String, Vec<SearchHit>)>,
    failing: bool,
    queries: Mutex<Vec<(String, Option<String>)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `hits` for queries containing `fragment`
    pub fn with_hits(mut self, fragment: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.results.push((fragment.into(), hits));
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Every query issued with its domain scope, in call order
    pub fn queries(&self) -> Vec<(String, Option<String>)> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl SearchService for MockSearch {
    async fn search(
        &self,
        query: &str,
        domain_scope: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        lock(&self.queries).push((query.to_string(), domain_scope.map(str::to_string)));

        if self.failing {
            return Err(SearchError::Api {
                status: 500,
                message: "search unavailable".to_string(),
            });
        }

        Ok(self
            .results
            .iter()
            .find(|(fragment, _)| query.contains(fragment.as_str()))
            .map(|(_, hits)| hits.clone())
            .unwrap_or_default())
    }
}

/// A search hit with the given fields
pub fn hit(url: &str, title: &str, snippet: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: snippet.to_string(),
    }
}

/// A configuration for tests: no request delay, small budgets
pub fn test_config(domain: &str, start_url: &str) -> Config {
    Config {
        site: SiteConfig {
            domain: domain.to_string(),
            start_url: start_url.to_string(),
            seed_paths: Vec::new(),
        },
        agent: AgentConfig {
            max_depth: 2,
            max_urls_per_tier: 10,
            max_search_queries_per_question: 3,
            request_delay_ms: 0,
            ..AgentConfig::default()
        },
        questions: QuestionsConfig {
            path: "questions.json".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "Prospector".to_string(),
            crawler_version: "0.1.0".to_string(),
            contact_url: "https://example.com/prospector".to_string(),
            contact_email: "prospector@example.com".to_string(),
        },
        oracle: OracleConfig {
            endpoint: "http://localhost:9/v1".to_string(),
            model: "test-model".to_string(),
            api_key_env: "PROSPECTOR_TEST_ORACLE_KEY".to_string(),
            timeout_secs: 5,
        },
        search: SearchConfig {
            endpoint: "http://localhost:9/search".to_string(),
            api_key_env: "PROSPECTOR_TEST_SEARCH_KEY".to_string(),
            max_results: 5,
            timeout_secs: 5,
        },
        output: OutputConfig {
            database_path: "./prospector.db".to_string(),
            report_path: "./output/answers.json".to_string(),
            summary_path: "./output/summary.md".to_string(),
        },
        static_answers: Vec::new(),
    }
}
