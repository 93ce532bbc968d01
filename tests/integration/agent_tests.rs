//! Integration tests for the agent
//!
//! These tests use wiremock to serve a small site over HTTP and run the full
//! waterfall end-to-end with scripted oracle and search doubles.

use prospector::config::Config;
use prospector::crawler::HttpFetcher;
use prospector::oracle::{ChatCompletionsOracle, OracleTask};
use prospector::orchestrator::{Collaborators, Orchestrator, Tier};
use prospector::output::{JsonAnswerSink, ReportSink, RunReport};
use prospector::questions::{parse_questions, Question};
use prospector::state::AnswerSource;
use prospector::storage::{SqliteStorage, Storage};
use prospector::testing::{test_config, MockFetcher, MockSearch, ScriptedOracle};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as HTML at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Builds a test configuration for the mock server's host
fn server_config(server: &MockServer) -> Config {
    let base = url::Url::parse(&server.uri()).expect("Failed to parse base URL");
    let host = base.host_str().expect("Failed to extract host").to_string();
    test_config(&host, &format!("{}/", server.uri()))
}

fn http_fetcher(config: &Config) -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::from_config(&config.user_agent).expect("Failed to build fetcher"))
}

async fn run_agent(
    config: &Config,
    questions: Vec<Question>,
    storage: SqliteStorage,
    fetcher: Arc<dyn prospector::crawler::Fetch>,
    oracle: Arc<dyn prospector::oracle::JudgmentOracle>,
    search: Arc<MockSearch>,
) -> RunReport {
    let collaborators = Collaborators {
        storage: Box::new(storage),
        fetcher,
        oracle,
        search,
    };
    let mut orchestrator =
        Orchestrator::new(config, questions, collaborators).expect("Failed to create orchestrator");
    orchestrator.run().await.expect("Run failed")
}

#[tokio::test]
async fn test_seed_page_answers_contact_email() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body><h1>Acme</h1><p>Write to kontakt@example.org</p></body></html>".to_string(),
    )
    .await;

    let config = server_config(&server);
    let questions = parse_questions(r#"{"01": "What is the contact email?"}"#).unwrap();
    let oracle = Arc::new(ScriptedOracle::new().with_fact(
        "01",
        "kontakt@example.org",
        "kontakt@example.org",
    ));

    let report = run_agent(
        &config,
        questions,
        SqliteStorage::new_in_memory().unwrap(),
        http_fetcher(&config),
        oracle,
        Arc::new(MockSearch::new()),
    )
    .await;

    let answer = report.answer("01").expect("01 should be answered");
    assert_eq!(answer.text, "kontakt@example.org");
    assert_eq!(answer.source, AnswerSource::Page(format!("{}/", server.uri())));
    assert_eq!(
        report.tiers_run,
        vec![Tier::Init, Tier::SeedSpecificPages, Tier::Done]
    );
}

#[tokio::test]
async fn test_crawl_then_pattern_extraction() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body>
            <a href="{base}/contact">Contact</a>
            <a href="{base}/quality">Quality</a>
            </body></html>"#
        ),
    )
    .await;
    mount_page(
        &server,
        "/contact",
        "<html><body><p>Office: kontakt@example.org</p></body></html>".to_string(),
    )
    .await;
    mount_page(
        &server,
        "/quality",
        "<html><body><p>Our production has been audited under ISO-9001:2015 since 2019.</p></body></html>"
            .to_string(),
    )
    .await;

    let config = server_config(&server);
    let questions = parse_questions(
        r#"{"01": "What is the contact email?", "02": "Which ISO certificate does the company hold?"}"#,
    )
    .unwrap();
    let oracle = Arc::new(
        ScriptedOracle::new()
            .with_fact("01", "kontakt@example.org", "kontakt@example.org")
            .with_pick("ISO-9001:2015"),
    );

    let report = run_agent(
        &config,
        questions,
        SqliteStorage::new_in_memory().unwrap(),
        http_fetcher(&config),
        oracle,
        Arc::new(MockSearch::new()),
    )
    .await;

    let contact = report.answer("01").expect("01 should be answered");
    assert_eq!(contact.tier, Tier::BfsCrawl);
    assert_eq!(contact.source, AnswerSource::Page(format!("{base}/contact")));

    let certificate = report.answer("02").expect("02 should be answered");
    assert_eq!(certificate.text, "ISO-9001:2015");
    assert_eq!(certificate.tier, Tier::PatternExtraction);
    assert_eq!(certificate.source, AnswerSource::Pattern);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_ranking_timeouts_do_not_halt_the_crawl() {
    let home = "https://example.org/";
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_page(home, "[A](/a) [B](/b) [C](/c) [D](/d)")
            .with_page("https://example.org/b", "Mail: biuro@example.org"),
    );
    let oracle = Arc::new(
        ScriptedOracle::new()
            .failing(OracleTask::RankLinks)
            .with_fact("01", "biuro@example.org", "biuro@example.org"),
    );

    let report = run_agent(
        &test_config("example.org", home),
        vec![Question::new("01", "What is the contact email?")],
        SqliteStorage::new_in_memory().unwrap(),
        fetcher.clone(),
        oracle.clone(),
        Arc::new(MockSearch::new()),
    )
    .await;

    assert_eq!(report.answer("01").map(|a| a.tier), Some(Tier::BfsCrawl));
    assert!(report.stats.ranking_fallbacks >= 1);
    assert!(report.stats.oracle_failures >= report.stats.ranking_fallbacks);
    assert!(oracle.call_count(OracleTask::RankLinks) >= 1);
    assert_eq!(fetcher.fetch_count("https://example.org/d"), 0);
}

#[tokio::test]
async fn test_unanswerable_question_reaches_done() {
    let home = "https://example.org/";
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("answers.json");

    let fetcher = Arc::new(
        MockFetcher::new()
            .with_page(home, "Welcome to Acme. [About](/about)")
            .with_page("https://example.org/about", "Founded by J. Nowak in 1990."),
    );
    let oracle = Arc::new(ScriptedOracle::new().with_fact("01", "Founded by", "J. Nowak"));
    let search = Arc::new(MockSearch::new());

    let report = run_agent(
        &test_config("example.org", home),
        vec![
            Question::new("01", "Who founded the company?"),
            Question::new("02", "What is the VAT number?"),
        ],
        SqliteStorage::new_in_memory().unwrap(),
        fetcher,
        oracle,
        search.clone(),
    )
    .await;

    assert_eq!(report.tiers_run, Tier::ORDER.to_vec());
    assert_eq!(report.unanswered, vec!["02".to_string()]);
    assert!(!search.queries().is_empty());

    JsonAnswerSink::new(&report_path).submit(&report).unwrap();
    let written: BTreeMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written["01"], "J. Nowak");
    assert!(!written.contains_key("02"));
}

#[tokio::test]
async fn test_rerun_serves_pages_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Write to kontakt@example.org</body></html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("prospector.db");
    let config = server_config(&server);
    let oracle = Arc::new(ScriptedOracle::new().with_fact(
        "01",
        "kontakt@example.org",
        "kontakt@example.org",
    ));
    let questions = vec![Question::new("01", "What is the contact email?")];

    let first = run_agent(
        &config,
        questions.clone(),
        SqliteStorage::new(&db_path).unwrap(),
        http_fetcher(&config),
        oracle.clone(),
        Arc::new(MockSearch::new()),
    )
    .await;
    let second = run_agent(
        &config,
        questions,
        SqliteStorage::new(&db_path).unwrap(),
        http_fetcher(&config),
        oracle,
        Arc::new(MockSearch::new()),
    )
    .await;

    assert_eq!(first.stats.pages_fetched, 1);
    assert_eq!(second.stats.pages_fetched, 0);
    assert_eq!(second.stats.cache_hits, 1);
    assert_eq!(first.answer_map(), second.answer_map());

    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    assert_eq!(storage.count_runs().unwrap(), 2);
    assert_eq!(storage.count_cached().unwrap(), 1);
}

#[tokio::test]
async fn test_crawl_stays_on_the_allowed_domain() {
    let home = "https://example.org/";
    let fetcher = Arc::new(MockFetcher::new().with_page(
        home,
        "[Partner](https://partner.example.com/contact) [Mirror](http://www.example.org/contact) [Contact](/contact)",
    ));
    let oracle = Arc::new(ScriptedOracle::new().with_default_score(9));

    run_agent(
        &test_config("example.org", home),
        vec![Question::new("01", "What is the contact email?")],
        SqliteStorage::new_in_memory().unwrap(),
        fetcher.clone(),
        oracle,
        Arc::new(MockSearch::new()),
    )
    .await;

    let calls = fetcher.calls();
    assert!(calls.contains(&"https://example.org/contact".to_string()));
    assert!(calls.iter().all(|url| url.starts_with("https://example.org/")));
}

#[tokio::test]
async fn test_tiers_escalate_in_order() {
    let home = "https://example.org/";
    let fetcher = Arc::new(MockFetcher::new().with_page(home, "Welcome"));
    let oracle = Arc::new(ScriptedOracle::new().with_inference("Gdańsk, Poland"));

    let report = run_agent(
        &test_config("example.org", home),
        vec![Question::new("01", "Where is the company located?")],
        SqliteStorage::new_in_memory().unwrap(),
        fetcher,
        oracle,
        Arc::new(MockSearch::new()),
    )
    .await;

    assert_eq!(
        report.tiers_run,
        vec![
            Tier::Init,
            Tier::SeedSpecificPages,
            Tier::BfsCrawl,
            Tier::AdditionalUrlDiscovery,
            Tier::PatternExtraction,
            Tier::CorpusInference,
            Tier::Done,
        ]
    );
    assert!(report.tiers_run.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(report.answer("01").map(|a| a.source.clone()), Some(AnswerSource::Inference));
}

#[tokio::test]
async fn test_end_to_end_with_chat_completions_oracle() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/",
        "<html><body><footer>kontakt@example.org</footer></body></html>".to_string(),
    )
    .await;

    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "```\n01: kontakt@example.org\n```"}}]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let config = server_config(&site);
    let oracle = ChatCompletionsOracle::new(
        format!("{}/v1", llm.uri()),
        "test-model",
        "secret",
        Duration::from_secs(5),
    )
    .unwrap();

    let report = run_agent(
        &config,
        vec![Question::new("01", "What is the contact email?")],
        SqliteStorage::new_in_memory().unwrap(),
        http_fetcher(&config),
        Arc::new(oracle),
        Arc::new(MockSearch::new()),
    )
    .await;

    assert_eq!(
        report.answer("01").map(|a| a.text.as_str()),
        Some("kontakt@example.org")
    );
}
