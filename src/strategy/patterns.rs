//! Deterministic pattern extraction over the whole corpus
//!
//! Candidates are generated by regex and only then shown to the oracle, which
//! may pick one of them verbatim or reject them all. It can never introduce a
//! string that does not occur in a fetched page. The one rewrite is a relative
//! link target, which is offered resolved against the page it appears on.

use crate::oracle::{
    strip_code_fence, JudgmentOracle, OracleError, OracleRequest, OracleTask, ParseError,
    NOT_FOUND,
};
use crate::orchestrator::MAX_PATTERN_CANDIDATES;
use crate::questions::Question;
use crate::state::Corpus;
use crate::strategy::classify::{significant_words, QuestionKind};
use crate::strategy::page_answer::clean_answer;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

/// Characters of context kept on each side of a match
pub const EVIDENCE_RADIUS: usize = 160;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("email pattern")
});

static LABELED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("labeled link pattern")
});

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("url pattern"));

static CERT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:ISO(?:/IEC)?|IEC|PN-EN|EN|IATF|OHSAS|AS|BS)[ -]?\d{3,5}(?:-\d{1,4})?(?::\d{4})?\b",
    )
    .expect("certification code pattern")
});

static CERT_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:certificate|certification|certyfikat|certyfikatu)(?i:\s+(?:no\.?|nr\.?|number|numer))?\s*[:#]?\s*([A-Z0-9][A-Z0-9./:-]{3,}[A-Z0-9])",
    )
    .expect("certificate context pattern")
});

/// One distinct match, aggregated over the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCandidate {
    pub text: String,

    /// Page of the first occurrence
    pub source_url: String,

    /// First occurrence with surrounding text
    pub evidence: String,

    /// Occurrences across the corpus
    pub count: usize,

    /// Found inside a labeled link whose label fits the question
    pub labeled: bool,

    first_seen: usize,
}

/// A single regex hit inside one page
struct Hit {
    start: usize,
    end: usize,
    label: Option<String>,

    /// Replaces the matched text, for resolved relative links
    resolved: Option<String>,
}

/// Runs the kind's battery over the corpus and ranks the distinct matches
///
/// Ranking: labeled-link matches first, then longer matches, then more
/// frequent ones, then earlier ones. `general` questions have no battery.
pub fn find_candidates(
    kind: QuestionKind,
    question: &Question,
    corpus: &Corpus,
) -> Vec<PatternCandidate> {
    if kind == QuestionKind::General {
        return Vec::new();
    }

    let question_words = significant_words(&question.text);
    let mut candidates: HashMap<String, PatternCandidate> = HashMap::new();
    let mut order = 0usize;

    for entry in corpus.entries() {
        let base = Url::parse(&entry.url).ok();
        for hit in run_battery(kind, &entry.text, base.as_ref()) {
            let text = hit
                .resolved
                .clone()
                .unwrap_or_else(|| entry.text[hit.start..hit.end].to_string());
            let labeled = hit
                .label
                .as_deref()
                .map(|label| label_fits(label, kind, &question_words))
                .unwrap_or(false);

            order += 1;
            let candidate = candidates.entry(text.clone()).or_insert_with(|| PatternCandidate {
                text,
                source_url: entry.url.clone(),
                evidence: evidence(&entry.text, hit.start, hit.end),
                count: 0,
                labeled: false,
                first_seen: order,
            });
            candidate.count += 1;
            candidate.labeled |= labeled;
        }
    }

    let mut ranked: Vec<PatternCandidate> = candidates.into_values().collect();
    ranked.sort_by(|a, b| {
        b.labeled
            .cmp(&a.labeled)
            .then_with(|| b.text.chars().count().cmp(&a.text.chars().count()))
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });
    ranked
}

fn run_battery(kind: QuestionKind, text: &str, base: Option<&Url>) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut spans = HashSet::new();

    let mut push = |hit: Hit, hits: &mut Vec<Hit>| {
        if spans.insert((hit.start, hit.end)) {
            hits.push(hit);
        }
    };
    let plain = |start: usize, end: usize| Hit {
        start,
        end,
        label: None,
        resolved: None,
    };

    match kind {
        QuestionKind::ContactAddress => {
            for m in EMAIL.find_iter(text) {
                push(plain(m.start(), m.end()), &mut hits);
            }
        }
        QuestionKind::ExternalResourceLink => {
            for caps in LABELED_LINK.captures_iter(text) {
                let (Some(label), Some(target)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let resolved = if is_absolute_web_url(target.as_str()) {
                    None
                } else {
                    match base.and_then(|base| resolve_link(base, target.as_str())) {
                        Some(url) => Some(url),
                        None => continue,
                    }
                };
                push(
                    Hit {
                        start: target.start(),
                        end: target.end(),
                        label: Some(label.as_str().to_string()),
                        resolved,
                    },
                    &mut hits,
                );
            }
            for m in BARE_URL.find_iter(text) {
                let trimmed = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
                push(plain(m.start(), m.start() + trimmed.len()), &mut hits);
            }
        }
        QuestionKind::CertificationCode => {
            for m in CERT_CODE.find_iter(text) {
                push(plain(m.start(), m.end()), &mut hits);
            }
            for caps in CERT_CONTEXT.captures_iter(text) {
                if let Some(code) = caps.get(1) {
                    if code.as_str().chars().any(|c| c.is_ascii_digit()) {
                        push(plain(code.start(), code.end()), &mut hits);
                    }
                }
            }
        }
        QuestionKind::General => {}
    }

    hits.sort_by_key(|hit| hit.start);
    hits
}

fn is_absolute_web_url(target: &str) -> bool {
    let lowered = target.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Resolves a relative link target to an absolute http(s) URL
///
/// Fragment-only targets and other schemes (`mailto:`, `tel:`, ...) give `None`.
fn resolve_link(base: &Url, target: &str) -> Option<String> {
    if target.starts_with('#') {
        return None;
    }
    let mut resolved = base.join(target).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

fn label_fits(label: &str, kind: QuestionKind, question_words: &[String]) -> bool {
    if kind.matches(label) {
        return true;
    }
    let label = label.to_lowercase();
    question_words.iter().any(|word| label.contains(word.as_str()))
}

fn evidence(text: &str, start: usize, end: usize) -> String {
    let before: Vec<char> = text[..start].chars().rev().take(EVIDENCE_RADIUS).collect();
    let before: String = before.into_iter().rev().collect();
    let after: String = text[end..].chars().take(EVIDENCE_RADIUS).collect();
    format!("{}{}{}", before, &text[start..end], after)
}

pub fn build_adjudication_request(
    question: &Question,
    candidates: &[PatternCandidate],
) -> OracleRequest {
    let mut prompt = format!(
        "Question: {}\n\nThe candidates below were found verbatim on the website, each with the text around it.\n\
         Reply with the one candidate that answers the question, copied exactly, and nothing else.\n\
         If none of them answers it, reply {}.\n",
        question.text, NOT_FOUND
    );
    for (i, candidate) in candidates.iter().enumerate() {
        prompt.push_str(&format!("\nCandidate {}: {}\n", i + 1, candidate.text));
    }

    let mut request = OracleRequest::new(OracleTask::AdjudicatePattern, prompt);
    for (i, candidate) in candidates.iter().enumerate() {
        request = request.with_document(format!(
            "Evidence for candidate {} ({}):\n{}",
            i + 1,
            candidate.source_url,
            candidate.evidence
        ));
    }
    request
}

/// Parses the oracle's pick strictly
///
/// `Ok(None)` means the oracle rejected every candidate.
pub fn parse_pick(
    reply: &str,
    candidates: &[PatternCandidate],
) -> Result<Option<String>, ParseError> {
    let pick = clean_answer(strip_code_fence(reply));

    if pick.is_empty() {
        return Err(ParseError::Empty);
    }
    if pick.trim_end_matches('.').eq_ignore_ascii_case(NOT_FOUND) {
        return Ok(None);
    }

    candidates
        .iter()
        .find(|c| c.text == pick)
        .map(|c| Some(c.text.clone()))
        .ok_or_else(|| ParseError::UnexpectedValue(format!("pick is not a candidate: {}", pick)))
}

/// Asks the oracle to choose among the top candidates
///
/// A malformed reply falls back to the only candidate when exactly one
/// distinct candidate exists. Oracle call errors are returned to the caller.
pub async fn adjudicate(
    oracle: &dyn JudgmentOracle,
    question: &Question,
    candidates: &[PatternCandidate],
) -> Result<Option<String>, OracleError> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let top = &candidates[..candidates.len().min(MAX_PATTERN_CANDIDATES)];
    let reply = oracle
        .judge(&build_adjudication_request(question, top))
        .await?;

    match parse_pick(&reply, top) {
        Ok(pick) => Ok(pick),
        Err(e) if candidates.len() == 1 => {
            tracing::debug!(question_id = %question.id, "Malformed pick ({}), taking the only candidate", e);
            Ok(Some(candidates[0].text.clone()))
        }
        Err(e) => {
            tracing::warn!(question_id = %question.id, "Malformed pick ({}), no answer", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::render_html;
    use async_trait::async_trait;

    fn corpus(pages: &[(&str, &str)]) -> Corpus {
        let mut corpus = Corpus::new(100_000, 10_000);
        for (url, text) in pages {
            corpus.append(url, text);
        }
        corpus
    }

    fn texts(candidates: &[PatternCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    struct FixedOracle(Result<&'static str, ()>);

    #[async_trait]
    impl JudgmentOracle for FixedOracle {
        async fn judge(&self, _request: &OracleRequest) -> Result<String, OracleError> {
            self.0.map(str::to_string).map_err(|_| OracleError::Timeout)
        }
    }

    #[test]
    fn test_certification_codes_in_prose() {
        let corpus = corpus(&[(
            "https://example.org/about",
            "Our plant has been certified to ISO-9001:2015 since 2019. We also follow EN 1090-2.",
        )]);
        let question = Question::new("02", "Which certificate does the company hold?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        assert_eq!(texts(&found), vec!["ISO-9001:2015", "EN 1090-2"]);
        assert_eq!(found[0].source_url, "https://example.org/about");
        assert!(found[0].evidence.contains("certified to ISO-9001:2015 since"));
    }

    #[test]
    fn test_certificate_number_context() {
        let corpus = corpus(&[("https://example.org/q", "Certificate no. QMS/4471/2023 issued by TUV")]);
        let question = Question::new("03", "What is the certificate number?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);
        assert_eq!(texts(&found), vec!["QMS/4471/2023"]);
    }

    #[test]
    fn test_emails_deduplicated_and_counted() {
        let corpus = corpus(&[
            ("https://example.org/", "Write to kontakt@example.org."),
            ("https://example.org/kontakt", "kontakt@example.org or sales@example.org"),
        ]);
        let question = Question::new("01", "What is the contact email?");
        let found = find_candidates(QuestionKind::ContactAddress, &question, &corpus);

        assert_eq!(texts(&found), vec!["kontakt@example.org", "sales@example.org"]);
        assert_eq!(found[0].count, 2);
    }

    #[test]
    fn test_labeled_link_preferred_over_longer() {
        let corpus = corpus(&[(
            "https://example.org/",
            "[Home](https://example.org/a/very/long/path/to/nothing) [Product catalogue](https://cdn.example.org/cat.pdf)",
        )]);
        let question = Question::new("04", "What is the link to the product catalogue?");
        let found = find_candidates(QuestionKind::ExternalResourceLink, &question, &corpus);

        assert_eq!(found[0].text, "https://cdn.example.org/cat.pdf");
        assert!(found[0].labeled);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_relative_link_resolved_against_page() {
        let page = "https://example.org/certificates";
        let html = r##"<html><body><p>Download our <a href="/files/iso-9001.pdf">ISO 9001 certificate</a> here.</p>
            <a href="mailto:biuro@example.org">Mail</a> <a href="#top">Top</a></body></html>"##;
        let corpus = corpus(&[(page, render_html(html).as_str())]);
        let question = Question::new("04", "What is the link to the ISO certificate?");
        let found = find_candidates(QuestionKind::ExternalResourceLink, &question, &corpus);

        assert_eq!(texts(&found), vec!["https://example.org/files/iso-9001.pdf"]);
        assert!(found[0].labeled);
        assert_eq!(found[0].source_url, page);
        assert!(found[0].evidence.contains("/files/iso-9001.pdf"));
    }

    #[test]
    fn test_general_has_no_battery() {
        let corpus = corpus(&[("https://example.org/", "Founded in 1990, ISO 9001")]);
        let question = Question::new("05", "When was it founded?");
        assert!(find_candidates(QuestionKind::General, &question, &corpus).is_empty());
    }

    #[test]
    fn test_parse_pick() {
        let corpus = corpus(&[("https://example.org/", "ISO 9001:2015 and ISO 14001")]);
        let question = Question::new("02", "Which certificate?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        assert_eq!(
            parse_pick("`ISO 14001`", &found),
            Ok(Some("ISO 14001".to_string()))
        );
        assert_eq!(parse_pick("NOT_FOUND", &found), Ok(None));
        assert!(matches!(
            parse_pick("ISO 27001", &found),
            Err(ParseError::UnexpectedValue(_))
        ));
    }

    #[tokio::test]
    async fn test_adjudicate_single_candidate_fallback() {
        let corpus = corpus(&[("https://example.org/", "Certified: ISO-9001:2015")]);
        let question = Question::new("02", "Which certificate?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        let oracle = FixedOracle(Ok("I think it is the ISO one"));
        let pick = adjudicate(&oracle, &question, &found).await.unwrap();
        assert_eq!(pick, Some("ISO-9001:2015".to_string()));
    }

    #[tokio::test]
    async fn test_adjudicate_never_overrides_sentinel() {
        let corpus = corpus(&[("https://example.org/", "Certified: ISO-9001:2015")]);
        let question = Question::new("02", "Which certificate?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        let oracle = FixedOracle(Ok("NOT_FOUND"));
        assert_eq!(adjudicate(&oracle, &question, &found).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_adjudicate_malformed_with_many_candidates() {
        let corpus = corpus(&[("https://example.org/", "ISO 9001:2015 and ISO 14001")]);
        let question = Question::new("02", "Which certificate?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        let oracle = FixedOracle(Ok("both"));
        assert_eq!(adjudicate(&oracle, &question, &found).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_adjudicate_propagates_oracle_errors() {
        let corpus = corpus(&[("https://example.org/", "ISO 9001")]);
        let question = Question::new("02", "Which certificate?");
        let found = find_candidates(QuestionKind::CertificationCode, &question, &corpus);

        let oracle = FixedOracle(Err(()));
        assert!(adjudicate(&oracle, &question, &found).await.is_err());
    }
}
