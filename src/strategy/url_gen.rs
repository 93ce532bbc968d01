//! Targeted URL generation for a stalled crawl

use crate::oracle::{strip_code_fence, OracleRequest, OracleTask, ParseError};
use crate::questions::Question;
use crate::url::SiteScope;
use std::collections::HashSet;

/// Paths tried when the oracle cannot suggest any
pub const COMMON_PATHS: &[&str] = &[
    "/contact",
    "/kontakt",
    "/about",
    "/about-us",
    "/o-nas",
    "/o-firmie",
    "/company",
    "/firma",
    "/certificates",
    "/certyfikaty",
    "/quality",
    "/jakosc",
    "/downloads",
    "/do-pobrania",
    "/impressum",
    "/sitemap",
];

pub fn build_paths_request(questions: &[&Question], scope: &SiteScope) -> OracleRequest {
    let mut prompt = format!(
        "The website {} did not answer the questions below through its visible links.\n\
         Suggest up to 10 paths that probably exist on this site and would answer them, \
         following common site conventions (about, contact, certificates, downloads, and so on).\n\
         Reply with a JSON array of strings only, for example [\"/contact\", \"/about-us\"].\n\nQuestions:\n",
        scope.domain()
    );
    for question in questions {
        prompt.push_str(&format!("- {}\n", question.text));
    }

    OracleRequest::new(OracleTask::SuggestPaths, prompt)
}

/// Parses a JSON array of paths
///
/// An empty array counts as a failed suggestion.
pub fn parse_paths(reply: &str) -> Result<Vec<String>, ParseError> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    let paths: Vec<String> = serde_json::from_str(body)?;
    let paths: Vec<String> = paths
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if paths.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(paths)
}

/// Resolves suggested paths against the start URL, dropping off-site ones
pub fn resolve_paths<S: AsRef<str>>(paths: &[S], scope: &SiteScope) -> Vec<String> {
    paths
        .iter()
        .filter_map(|path| scope.resolve(path.as_ref(), scope.start_url()))
        .map(|url| url.to_string())
        .collect()
}

/// Merges generated and previously discovered URLs into one capped batch
///
/// Generated URLs come first. URLs for which `is_done` holds are skipped and
/// each URL appears once.
pub fn merge_batch(
    generated: Vec<String>,
    discovered: Vec<String>,
    is_done: impl Fn(&str) -> bool,
    cap: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    generated
        .into_iter()
        .chain(discovered)
        .filter(|url| !is_done(url))
        .filter(|url| seen.insert(url.clone()))
        .take(cap)
        .collect()
}
