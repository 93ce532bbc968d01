//! Query planning for the web search fallback

use crate::questions::Question;
use crate::search::SearchHit;
use crate::strategy::classify::QuestionKind;

/// Characters of each snippet kept in the synthesized document
const SNIPPET_MAX_CHARS: usize = 500;

/// One planned search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,

    /// Restrict results to the site's domain
    pub scoped: bool,
}

fn templates(kind: QuestionKind) -> &'static [&'static str] {
    match kind {
        QuestionKind::ContactAddress => &["contact e-mail", "kontakt e-mail"],
        QuestionKind::ExternalResourceLink => &["{question} link", "download"],
        QuestionKind::CertificationCode => &["certificate ISO", "certyfikat ISO"],
        QuestionKind::General => &[],
    }
}

/// Builds at most `max_queries` queries for one question
///
/// Domain-scoped queries come first: the question itself, then the kind's
/// templates. The last query is always a single unscoped one that names the
/// domain in its text. With a budget of one, only the unscoped query is
/// planned.
pub fn build_queries(
    question: &Question,
    kind: QuestionKind,
    domain: &str,
    max_queries: u32,
) -> Vec<SearchQuery> {
    if max_queries == 0 {
        return Vec::new();
    }

    let scoped_budget = (max_queries - 1) as usize;
    let mut scoped_texts: Vec<String> = vec![question.text.clone()];
    for template in templates(kind) {
        let text = template.replace("{question}", &question.text);
        if !scoped_texts.contains(&text) {
            scoped_texts.push(text);
        }
    }

    let mut queries: Vec<SearchQuery> = scoped_texts
        .into_iter()
        .take(scoped_budget)
        .map(|text| SearchQuery { text, scoped: true })
        .collect();

    queries.push(SearchQuery {
        text: format!("{} {}", question.text, domain),
        scoped: false,
    });

    queries
}

/// Joins titles and snippets of search hits into one document
pub fn synthesize_document(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            let snippet: String = hit.snippet.chars().take(SNIPPET_MAX_CHARS).collect();
            format!("Title: {}\nURL: {}\n{}", hit.title, hit.url, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new("01", "What is the contact email?")
    }

    #[test]
    fn test_scoped_first_unscoped_last() {
        let queries = build_queries(&question(), QuestionKind::ContactAddress, "example.org", 4);

        assert_eq!(queries.len(), 4);
        assert!(queries[..3].iter().all(|q| q.scoped));
        assert_eq!(queries[0].text, "What is the contact email?");
        assert_eq!(
            queries[3],
            SearchQuery {
                text: "What is the contact email? example.org".to_string(),
                scoped: false,
            }
        );
    }

    #[test]
    fn test_budget_limits_scoped_queries() {
        let queries = build_queries(&question(), QuestionKind::ContactAddress, "example.org", 2);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].scoped);
        assert!(!queries[1].scoped);

        let queries = build_queries(&question(), QuestionKind::ContactAddress, "example.org", 1);
        assert_eq!(queries.len(), 1);
        assert!(!queries[0].scoped);
    }

    #[test]
    fn test_general_questions_use_question_text_only() {
        let queries = build_queries(&question(), QuestionKind::General, "example.org", 10);
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn test_link_template_expands_question() {
        let queries =
            build_queries(&question(), QuestionKind::ExternalResourceLink, "example.org", 4);
        assert_eq!(queries[1].text, "What is the contact email? link");
    }

    #[test]
    fn test_synthesize_document() {
        let hits = vec![
            SearchHit {
                url: "https://example.org/kontakt".to_string(),
                title: "Kontakt".to_string(),
                snippet: "Write to kontakt@example.org".to_string(),
            },
            SearchHit {
                url: "https://example.org/".to_string(),
                title: "Home".to_string(),
                snippet: "x".repeat(600),
            },
        ];
        let document = synthesize_document(&hits);
        assert!(document.starts_with("Title: Kontakt\nURL: https://example.org/kontakt\nWrite to"));
        assert!(!document.contains(&"x".repeat(501)));
    }
}
