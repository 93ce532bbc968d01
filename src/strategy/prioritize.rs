//! Relevance ranking of candidate links
//!
//! The oracle scores each candidate from 1 to 10 against the outstanding
//! questions. Only scores of 6 or more survive, best first, at most
//! [`MAX_RANKED_LINKS`]. When the oracle fails or its reply cannot be parsed,
//! the first [`FALLBACK_LINKS`] candidates are taken in discovery order.

use crate::crawler::DiscoveredLink;
use crate::oracle::{strip_code_fence, JudgmentOracle, OracleRequest, OracleTask, ParseError};
use crate::orchestrator::{FALLBACK_LINKS, MAX_RANKED_LINKS};
use crate::questions::Question;
use serde::Deserialize;
use std::collections::HashSet;

/// Lowest score that keeps a link
pub const MIN_RELEVANCE: u8 = 6;

/// A link selected for crawling, with its relevance score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedLink {
    pub url: String,
    pub score: u8,
}

/// Outcome of one ranking call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub links: Vec<RankedLink>,

    /// True if the discovery-order fallback was used
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    scores: Vec<ScoreEntry>,
}

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    url: String,
    score: i64,
}

pub fn build_rank_request(
    questions: &[&Question],
    candidates: &[DiscoveredLink],
    context: &str,
) -> OracleRequest {
    let mut prompt = String::from(
        "We are looking for pages on a website that answer the questions below.\n\
         Score every candidate link from 1 (irrelevant) to 10 (almost certainly answers a question).\n\
         Reply with JSON only: {\"scores\": [{\"url\": \"<candidate url>\", \"score\": <1-10>}]}\n\nQuestions:\n",
    );
    for question in questions {
        prompt.push_str(&format!("- {}\n", question.text));
    }

    prompt.push_str("\nCandidates:\n");
    for link in candidates {
        if link.label.is_empty() {
            prompt.push_str(&format!("- {}\n", link.url));
        } else {
            prompt.push_str(&format!("- {} (label: {})\n", link.url, link.label));
        }
    }

    OracleRequest::new(OracleTask::RankLinks, prompt)
        .with_document(format!("Page the links were found on:\n{}", context))
}

/// Parses a ranking reply strictly
///
/// Unknown URLs and scores outside 1..=10 are errors. Candidates the reply
/// leaves out are treated as irrelevant. Repeated URLs keep their first score.
pub fn parse_rankings(
    reply: &str,
    candidates: &[DiscoveredLink],
) -> Result<Vec<RankedLink>, ParseError> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    let parsed: ScoreReply = serde_json::from_str(body)?;
    let known: HashSet<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

    let mut seen = HashSet::new();
    let mut ranked = Vec::new();

    for entry in parsed.scores {
        if !known.contains(entry.url.as_str()) {
            return Err(ParseError::UnexpectedValue(format!(
                "unknown candidate {}",
                entry.url
            )));
        }
        if !(1..=10).contains(&entry.score) {
            return Err(ParseError::UnexpectedValue(format!(
                "score {} for {}",
                entry.score, entry.url
            )));
        }
        if seen.insert(entry.url.clone()) {
            ranked.push(RankedLink {
                url: entry.url,
                score: entry.score as u8,
            });
        }
    }

    ranked.retain(|link| link.score >= MIN_RELEVANCE);
    // Stable sort keeps reply order among equal scores
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_RANKED_LINKS);

    Ok(ranked)
}

/// First candidates in discovery order with descending synthetic scores
pub fn fallback_rankings(candidates: &[DiscoveredLink]) -> Vec<RankedLink> {
    candidates
        .iter()
        .take(FALLBACK_LINKS)
        .enumerate()
        .map(|(i, link)| RankedLink {
            url: link.url.clone(),
            score: (FALLBACK_LINKS - i) as u8,
        })
        .collect()
}

/// Ranks candidates, falling back to discovery order on any oracle problem
pub async fn prioritize(
    oracle: &dyn JudgmentOracle,
    questions: &[&Question],
    candidates: &[DiscoveredLink],
    context: &str,
) -> Ranking {
    if candidates.is_empty() {
        return Ranking {
            links: Vec::new(),
            fallback: false,
        };
    }

    let request = build_rank_request(questions, candidates, context);

    let parsed = match oracle.judge(&request).await {
        Ok(reply) => parse_rankings(&reply, candidates).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match parsed {
        Ok(links) => Ranking {
            links,
            fallback: false,
        },
        Err(reason) => {
            tracing::warn!("Link ranking failed ({}), using discovery order", reason);
            Ranking {
                links: fallback_rankings(candidates),
                fallback: true,
            }
        }
    }
}
