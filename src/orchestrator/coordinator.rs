//! Orchestrator - the evidence-gathering waterfall
//!
//! This module contains the main run loop that coordinates all tiers:
//! - Fetching seed pages and crawling breadth-first through the content cache
//! - Reading pages with the oracle and following ranked links
//! - Escalating through URL discovery, pattern extraction, corpus inference
//!   and web search while questions remain
//! - Recording the run and producing the final report

use crate::config::{resolve_api_key, Config, StaticAnswer};
use crate::crawler::{extract_links, DiscoveredLink, Fetch, HttpFetcher};
use crate::oracle::{ChatCompletionsOracle, JudgmentOracle, OracleError, OracleRequest};
use crate::orchestrator::{Allowance, Budget, Tier};
use crate::output::{RunReport, RunStats};
use crate::questions::Question;
use crate::search::{SearchService, TavilySearch};
use crate::state::{
    truncate_chars, Answer, AnswerLedger, AnswerSource, Corpus, FrontierState,
};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::strategy::inference::{build_infer_request, parse_inference, static_answer};
use crate::strategy::page_answer::build_extract_request;
use crate::strategy::patterns::adjudicate;
use crate::strategy::url_gen::{
    build_paths_request, merge_batch, parse_paths, resolve_paths, COMMON_PATHS,
};
use crate::strategy::web_search::{build_queries, synthesize_document};
use crate::strategy::{
    classify, find_candidates, parse_page_answers, prioritize, QuestionKind, PAGE_MIN_ANSWER_LEN,
    SEARCH_MIN_ANSWER_LEN,
};
use crate::url::SiteScope;
use crate::Result;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Characters of the current page shown to the link ranker
const RANK_CONTEXT_CHARS: usize = 2_000;

/// Characters of corpus sent with an inference request
const INFERENCE_CORPUS_CHARS: usize = 60_000;

/// External services the orchestrator works through
pub struct Collaborators {
    pub storage: Box<dyn Storage>,
    pub fetcher: Arc<dyn Fetch>,
    pub oracle: Arc<dyn JudgmentOracle>,
    pub search: Arc<dyn SearchService>,
}

impl Collaborators {
    /// Builds the production adapters described by the configuration
    ///
    /// API keys are read from the environment variables the configuration
    /// names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let fetcher = HttpFetcher::from_config(&config.user_agent)?;

        let oracle_key = resolve_api_key(&config.oracle.api_key_env)?;
        let oracle = ChatCompletionsOracle::from_config(&config.oracle, oracle_key)?;

        let search_key = resolve_api_key(&config.search.api_key_env)?;
        let search = TavilySearch::from_config(&config.search, search_key)?;

        Ok(Self {
            storage: Box::new(storage),
            fetcher: Arc::new(fetcher),
            oracle: Arc::new(oracle),
            search: Arc::new(search),
        })
    }
}

/// Main orchestrator structure
///
/// Owns all mutable run state. Strategies return values; only the
/// orchestrator writes to the frontier, the corpus and the ledger.
pub struct Orchestrator {
    scope: SiteScope,
    seed_paths: Vec<String>,
    budget: Budget,
    questions: Vec<Question>,
    kinds: HashMap<String, QuestionKind>,
    static_answers: Vec<StaticAnswer>,
    page_prompt_chars: usize,
    config_hash: String,

    storage: Box<dyn Storage>,
    fetcher: Arc<dyn Fetch>,
    oracle: Arc<dyn JudgmentOracle>,
    search: Arc<dyn SearchService>,

    ledger: AnswerLedger,
    frontier: FrontierState,
    corpus: Corpus,
    seed_pages: Vec<(String, String)>,
    tiers_run: Vec<Tier>,
    stats: RunStats,
    run_id: Option<i64>,
    last_request: Option<Instant>,
}

impl Orchestrator {
    /// Creates an orchestrator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The agent configuration
    /// * `questions` - The question set, already loaded and validated
    /// * `collaborators` - Storage, fetcher, oracle and search service
    pub fn new(
        config: &Config,
        questions: Vec<Question>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let scope = SiteScope::from_config(&config.site)?;

        let kinds = questions
            .iter()
            .map(|q| (q.id.clone(), classify(q)))
            .collect::<HashMap<_, _>>();
        for question in &questions {
            tracing::debug!(
                question_id = %question.id,
                kind = %kinds[&question.id],
                "Classified question"
            );
        }

        Ok(Self {
            scope,
            seed_paths: config.site.seed_paths.clone(),
            budget: Budget::from_config(&config.agent),
            ledger: AnswerLedger::new(&questions),
            questions,
            kinds,
            static_answers: config.static_answers.clone(),
            page_prompt_chars: config.agent.page_max_chars,
            config_hash: String::new(),
            storage: collaborators.storage,
            fetcher: collaborators.fetcher,
            oracle: collaborators.oracle,
            search: collaborators.search,
            frontier: FrontierState::new(),
            corpus: Corpus::new(config.agent.corpus_max_chars, config.agent.page_max_chars),
            seed_pages: Vec::new(),
            tiers_run: Vec::new(),
            stats: RunStats::default(),
            run_id: None,
            last_request: None,
        })
    }

    /// Sets the configuration hash recorded with the run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn frontier(&self) -> &FrontierState {
        &self.frontier
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Gives the storage back once the orchestrator is no longer needed
    pub fn into_storage(self) -> Box<dyn Storage> {
        self.storage
    }

    /// Runs the waterfall to `DONE` and returns the report
    ///
    /// Every tier after `INIT` is entered only while questions remain. The
    /// run is recorded in storage; if a tier fails with an error, the run is
    /// marked failed before the error is returned.
    pub async fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let run_id = self
            .storage
            .create_run(&self.config_hash, self.questions.len() as u32)?;
        self.run_id = Some(run_id);

        tracing::info!(
            "Starting run {} for {} ({} questions)",
            run_id,
            self.scope.start_url(),
            self.questions.len()
        );

        match self.walk_tiers().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                if let Err(status_error) = self.storage.update_run_status(run_id, RunStatus::Failed)
                {
                    tracing::warn!("Failed to mark run {} as failed: {}", run_id, status_error);
                }
                return Err(e);
            }
        }

        for answer in self.ledger.answers() {
            self.storage.record_answer(run_id, answer)?;
        }
        self.storage.complete_run(run_id, self.ledger.len() as u32)?;

        let report = self.report(started);
        tracing::info!(
            "Run {} finished: {} / {} answered, {} URLs seen, {} fetched, {} failed",
            run_id,
            report.answers.len(),
            report.total_questions(),
            self.frontier.seen_count(),
            self.frontier.fetched_count(),
            self.frontier.failed_count()
        );
        Ok(report)
    }

    async fn walk_tiers(&mut self) -> Result<()> {
        let mut tier = Tier::Init;
        self.enter(tier);

        loop {
            tier = tier.next();
            if tier.is_terminal() {
                break;
            }
            if self.ledger.is_complete() {
                tracing::info!("All questions answered, skipping remaining tiers");
                break;
            }

            self.enter(tier);
            match tier {
                Tier::SeedSpecificPages => self.seed_tier().await?,
                Tier::BfsCrawl => self.bfs_tier().await?,
                Tier::AdditionalUrlDiscovery => self.discovery_tier().await?,
                Tier::PatternExtraction => self.pattern_tier().await?,
                Tier::CorpusInference => self.inference_tier().await?,
                Tier::WebSearch => self.web_search_tier().await?,
                Tier::Init | Tier::Done => {}
            }
        }

        self.enter(Tier::Done);
        Ok(())
    }

    fn enter(&mut self, tier: Tier) {
        tracing::info!(
            "Entering {} ({} questions outstanding)",
            tier,
            self.ledger.unanswered_ids().len()
        );
        self.tiers_run.push(tier);
    }

    // ===== Crawl tiers =====

    /// Fetches the start URL and seed paths, then reads each page
    ///
    /// Cache misses are fetched concurrently; cache writes happen after the
    /// batch completes.
    async fn seed_tier(&mut self) -> Result<()> {
        let seeds = self.scope.seed_urls(&self.seed_paths);
        let mut texts: HashMap<String, String> = HashMap::new();
        let mut misses = Vec::new();

        for url in &seeds {
            self.frontier.mark_seen(url);
            match self.storage.get_cached(url)? {
                Some(text) => {
                    self.stats.cache_hits += 1;
                    texts.insert(url.clone(), text);
                }
                None => misses.push(url.clone()),
            }
        }

        if !misses.is_empty() {
            self.pace().await;
            tracing::debug!("Fetching {} seed pages", misses.len());

            let fetcher = Arc::clone(&self.fetcher);
            let results = join_all(misses.iter().map(|url| {
                let fetcher = Arc::clone(&fetcher);
                async move { fetcher.fetch(url).await }
            }))
            .await;
            self.last_request = Some(Instant::now());

            for (url, result) in misses.iter().zip(results) {
                match result {
                    Ok(text) => {
                        self.stats.pages_fetched += 1;
                        self.storage.put_cached(url, &text)?;
                        texts.insert(url.clone(), text);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to fetch seed {}: {}", url, e);
                        self.stats.fetch_failures += 1;
                        self.frontier.mark_failed(url);
                    }
                }
            }
        }

        for url in seeds {
            let Some(text) = texts.remove(&url) else {
                continue;
            };
            self.frontier.mark_fetched(&url);
            self.corpus.append(&url, &text);
            self.read_page(&url, &text, Tier::SeedSpecificPages).await;
            self.seed_pages.push((url, text));
        }

        Ok(())
    }

    /// Expands the seed pages, then crawls the queue level by level
    async fn bfs_tier(&mut self) -> Result<()> {
        let seed_pages = std::mem::take(&mut self.seed_pages);
        if self.budget.can_expand(0) {
            for (url, text) in &seed_pages {
                if self.ledger.is_complete() {
                    break;
                }
                self.expand_links(url, text, 0).await;
            }
        }

        let mut allowance = Allowance::new(self.budget.max_urls_per_tier);

        while !self.ledger.is_complete() {
            if !allowance.take() {
                tracing::info!(
                    "Crawl budget of {} URLs exhausted, {} still queued",
                    self.budget.max_urls_per_tier,
                    self.frontier.queue_len()
                );
                break;
            }

            let Some(next) = self.frontier.pop_next() else {
                tracing::info!("Frontier is empty");
                break;
            };

            tracing::debug!("Crawling {} (depth {}, score {})", next.url, next.depth, next.score);
            self.crawl_url(&next.url, next.depth, Tier::BfsCrawl).await?;
        }

        Ok(())
    }

    /// Crawls generated and leftover URLs as leaves
    async fn discovery_tier(&mut self) -> Result<()> {
        let outstanding: Vec<Question> = self
            .ledger
            .outstanding(&self.questions)
            .into_iter()
            .cloned()
            .collect();
        let refs: Vec<&Question> = outstanding.iter().collect();

        let request = build_paths_request(&refs, &self.scope);
        let paths = match self.ask(&request).await {
            Ok(reply) => match parse_paths(&reply) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!("Unusable path suggestions ({}), using common paths", e);
                    common_paths()
                }
            },
            Err(_) => common_paths(),
        };

        let generated = resolve_paths(&paths, &self.scope);
        let mut leftovers: Vec<String> = self
            .frontier
            .queued()
            .iter()
            .map(|queued| queued.url.clone())
            .collect();
        leftovers.extend(self.frontier.unvisited());

        let frontier = &self.frontier;
        let batch = merge_batch(
            generated,
            leftovers,
            |url| frontier.is_done(url),
            self.budget.max_urls_per_tier as usize,
        );
        tracing::info!("Crawling {} additional URLs", batch.len());

        let leaf_depth = self.budget.max_depth;
        for url in batch {
            if self.ledger.is_complete() {
                break;
            }
            self.frontier.mark_seen(&url);
            self.crawl_url(&url, leaf_depth, Tier::AdditionalUrlDiscovery)
                .await?;
        }

        Ok(())
    }

    /// Fetches one URL, reads it and, below the depth limit, follows its links
    async fn crawl_url(&mut self, url: &str, depth: u32, tier: Tier) -> Result<()> {
        if self.frontier.is_done(url) {
            return Ok(());
        }

        let Some(text) = self.fetch_page(url).await? else {
            return Ok(());
        };

        self.corpus.append(url, &text);
        self.read_page(url, &text, tier).await;

        if self.budget.can_expand(depth) && !self.ledger.is_complete() {
            self.expand_links(url, &text, depth).await;
        }

        Ok(())
    }

    /// Returns page text from the cache or the network
    ///
    /// `None` means the fetch failed; the URL is then marked failed and never
    /// attempted again.
    async fn fetch_page(&mut self, url: &str) -> Result<Option<String>> {
        if let Some(text) = self.storage.get_cached(url)? {
            tracing::debug!("Cache hit for {}", url);
            self.stats.cache_hits += 1;
            self.frontier.mark_fetched(url);
            return Ok(Some(text));
        }

        self.pace().await;
        let result = self.fetcher.fetch(url).await;
        self.last_request = Some(Instant::now());

        match result {
            Ok(text) => {
                self.stats.pages_fetched += 1;
                self.storage.put_cached(url, &text)?;
                self.frontier.mark_fetched(url);
                Ok(Some(text))
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.stats.fetch_failures += 1;
                self.frontier.mark_failed(url);
                Ok(None)
            }
        }
    }

    /// Asks the oracle which outstanding questions the page answers
    async fn read_page(&mut self, url: &str, text: &str, tier: Tier) {
        let targets = self.page_targets();
        if targets.is_empty() {
            return;
        }
        let refs: Vec<&Question> = targets.iter().collect();

        let request =
            build_extract_request(&refs, url, truncate_chars(text, self.page_prompt_chars));
        let Ok(reply) = self.ask(&request).await else {
            return;
        };

        for (question_id, answer_text) in parse_page_answers(&reply, &refs, PAGE_MIN_ANSWER_LEN) {
            let answer = Answer::new(
                &question_id,
                answer_text,
                AnswerSource::Page(url.to_string()),
                tier,
            );

            if self.ledger.is_answered(&question_id) {
                self.try_refine(&question_id, answer, url);
                continue;
            }

            self.record(answer);
        }
    }

    /// Outstanding questions plus answered ones that may still be refined
    fn page_targets(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| !self.ledger.is_answered(&q.id) || self.is_refinable(&q.id))
            .cloned()
            .collect()
    }

    /// A link question answered with a URL stays open to a more specific URL
    fn is_refinable(&self, question_id: &str) -> bool {
        self.kinds.get(question_id) == Some(&QuestionKind::ExternalResourceLink)
            && self
                .ledger
                .get(question_id)
                .map(|answer| answer.is_url_shaped())
                .unwrap_or(false)
    }

    fn try_refine(&mut self, question_id: &str, replacement: Answer, page_url: &str) {
        if !self.is_refinable(question_id) || !replacement.is_url_shaped() {
            return;
        }

        let extends = self
            .ledger
            .get(question_id)
            .map(|current| {
                replacement.text.len() > current.text.len()
                    && replacement.text.starts_with(&current.text)
            })
            .unwrap_or(false);
        if !extends {
            return;
        }

        let reason = format!("more specific URL found on {}", page_url);
        if let Err(e) = self.ledger.refine(question_id, replacement, &reason) {
            tracing::warn!("Refinement rejected: {}", e);
        }
    }

    /// Ranks new links from a page and queues them one level deeper
    async fn expand_links(&mut self, url: &str, text: &str, depth: u32) {
        let Ok(base) = Url::parse(url) else {
            return;
        };

        let candidates: Vec<DiscoveredLink> = extract_links(text, &base, &self.scope)
            .into_iter()
            .filter(|link| self.frontier.mark_seen(&link.url))
            .collect();
        if candidates.is_empty() {
            return;
        }
        self.stats.links_discovered += candidates.len() as u64;

        let outstanding = self.ledger.outstanding(&self.questions);
        self.stats.oracle_calls += 1;
        let ranking = prioritize(
            self.oracle.as_ref(),
            &outstanding,
            &candidates,
            truncate_chars(text, RANK_CONTEXT_CHARS),
        )
        .await;

        if ranking.fallback {
            self.stats.ranking_fallbacks += 1;
            self.stats.oracle_failures += 1;
        }

        let mut queued = 0;
        for link in ranking.links {
            if self.frontier.enqueue(&link.url, depth + 1, link.score) {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} new links, {} queued at depth {}",
            url,
            candidates.len(),
            queued,
            depth + 1
        );
    }

    // ===== Fallback tiers =====

    async fn pattern_tier(&mut self) -> Result<()> {
        for question in self.outstanding_questions() {
            let kind = self.kind_of(&question);
            let candidates = find_candidates(kind, &question, &self.corpus);
            if candidates.is_empty() {
                tracing::debug!(question_id = %question.id, %kind, "No pattern candidates");
                continue;
            }

            self.stats.oracle_calls += 1;
            match adjudicate(self.oracle.as_ref(), &question, &candidates).await {
                Ok(Some(pick)) => {
                    self.record(Answer::new(
                        &question.id,
                        pick,
                        AnswerSource::Pattern,
                        Tier::PatternExtraction,
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.oracle_failures += 1;
                    tracing::warn!("Oracle failed during pattern extraction, skipping tier: {}", e);
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    async fn inference_tier(&mut self) -> Result<()> {
        for question in self.outstanding_questions() {
            let kind = self.kind_of(&question);

            let known = static_answer(&question, kind, &self.static_answers).map(str::to_string);
            if let Some(known) = known {
                let answer = Answer::new(
                    &question.id,
                    known,
                    AnswerSource::Inference,
                    Tier::CorpusInference,
                );
                self.record(answer);
                continue;
            }

            let request = build_infer_request(&question, &self.corpus.render(INFERENCE_CORPUS_CHARS));
            match self.ask(&request).await {
                Ok(reply) => {
                    if let Some(inferred) = parse_inference(&reply) {
                        self.record(Answer::new(
                            &question.id,
                            inferred,
                            AnswerSource::Inference,
                            Tier::CorpusInference,
                        ));
                    }
                }
                Err(_) => {
                    tracing::warn!("Skipping the rest of corpus inference");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    async fn web_search_tier(&mut self) -> Result<()> {
        let domain = self.scope.domain().to_string();

        for question in self.outstanding_questions() {
            let kind = self.kind_of(&question);
            let queries = build_queries(
                &question,
                kind,
                &domain,
                self.budget.max_search_queries_per_question,
            );

            for query in queries {
                self.pace().await;
                self.stats.search_queries += 1;
                let scope = if query.scoped { Some(domain.as_str()) } else { None };
                let result = self.search.search(&query.text, scope).await;
                self.last_request = Some(Instant::now());

                let hits = match result {
                    Ok(hits) => hits,
                    Err(e) => {
                        tracing::warn!("Search failed for '{}': {}", query.text, e);
                        continue;
                    }
                };
                if hits.is_empty() {
                    tracing::debug!("No results for '{}' (scoped: {})", query.text, query.scoped);
                    continue;
                }

                let document = synthesize_document(&hits);
                let source = format!("web search: {}", query.text);
                let request = build_extract_request(&[&question], &source, &document);
                let Ok(reply) = self.ask(&request).await else {
                    tracing::warn!("Skipping the rest of web search");
                    return Ok(());
                };

                let accepted = parse_page_answers(&reply, &[&question], SEARCH_MIN_ANSWER_LEN)
                    .into_iter()
                    .next();
                if let Some((_, text)) = accepted {
                    self.record(Answer::new(
                        &question.id,
                        text,
                        AnswerSource::WebSearch(query.text.clone()),
                        Tier::WebSearch,
                    ));
                    break;
                }
            }
        }

        Ok(())
    }

    // ===== Helpers =====

    fn outstanding_questions(&self) -> Vec<Question> {
        self.ledger
            .outstanding(&self.questions)
            .into_iter()
            .cloned()
            .collect()
    }

    fn kind_of(&self, question: &Question) -> QuestionKind {
        self.kinds
            .get(&question.id)
            .copied()
            .unwrap_or(QuestionKind::General)
    }

    fn record(&mut self, answer: Answer) {
        if let Err(e) = self.ledger.set(answer) {
            tracing::warn!("Discarding answer: {}", e);
        }
    }

    async fn ask(&mut self, request: &OracleRequest) -> std::result::Result<String, OracleError> {
        self.stats.oracle_calls += 1;
        let result = self.oracle.judge(request).await;
        if let Err(e) = &result {
            self.stats.oracle_failures += 1;
            tracing::warn!(task = %request.task, "Oracle call failed: {}", e);
        }
        result
    }

    /// Waits until the request delay has passed since the last network call
    async fn pace(&self) {
        let Some(last) = self.last_request else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < self.budget.request_delay {
            tokio::time::sleep(self.budget.request_delay - elapsed).await;
        }
    }

    fn report(&self, started: Instant) -> RunReport {
        let mut stats = self.stats.clone();
        stats.corpus_pages = self.corpus.len() as u64;
        stats.corpus_chars = self.corpus.total_chars() as u64;
        stats.duration_ms = started.elapsed().as_millis() as u64;

        RunReport {
            run_id: self.run_id,
            answers: self.ledger.answers().cloned().collect(),
            unanswered: self.ledger.unanswered_ids(),
            tiers_run: self.tiers_run.clone(),
            refinements: self.ledger.refinements().to_vec(),
            stats,
        }
    }
}

fn common_paths() -> Vec<String> {
    COMMON_PATHS.iter().map(|p| p.to_string()).collect()
}
