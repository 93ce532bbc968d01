//! Page answer extraction
//!
//! The oracle reads one document and replies with one line per question,
//! `<id>: <answer>` or `<id>: NOT_FOUND`. Lines are matched per id with an
//! anchored pattern; anything that does not match is silently rejected.

use crate::oracle::{strip_code_fence, OracleRequest, OracleTask, NOT_FOUND};
use crate::questions::Question;
use regex::Regex;

/// Answers read from fetched pages must be longer than this
pub const PAGE_MIN_ANSWER_LEN: usize = 3;

/// Answers read from search snippets must be longer than this
pub const SEARCH_MIN_ANSWER_LEN: usize = 10;

/// Builds the extraction request for one document
pub fn build_extract_request(questions: &[&Question], source: &str, text: &str) -> OracleRequest {
    let mut prompt = String::from(
        "Read the document below and answer each question using only information stated in it.\n\
         Reply with exactly one line per question, in the form `<id>: <answer>`.\n",
    );
    prompt.push_str(&format!(
        "If the document does not answer a question, reply `<id>: {}`.\n",
        NOT_FOUND
    ));
    prompt.push_str("Give the answer itself (an address, a code, a URL), not a sentence.\n\nQuestions:\n");

    for question in questions {
        prompt.push_str(&format!("{}: {}\n", question.id, question.text));
    }

    OracleRequest::new(OracleTask::ExtractAnswers, prompt)
        .with_document(format!("Source: {}\n\n{}", source, text))
}

/// Parses an extraction reply into `(question id, answer)` pairs
///
/// A pair is kept only if its line exists, is not `NOT_FOUND`, and the
/// answer has more than `min_len` characters. Pairs come back in question
/// order.
pub fn parse_page_answers(
    reply: &str,
    questions: &[&Question],
    min_len: usize,
) -> Vec<(String, String)> {
    let reply = strip_code_fence(reply);
    let mut answers = Vec::new();

    for question in questions {
        // Horizontal whitespace only: an answer never spans lines
        let pattern = format!(
            r"(?m)^[ \t]*{}[ \t]*:[ \t]*([^\n]+?)[ \t]*$",
            regex::escape(&question.id)
        );
        let Ok(line) = Regex::new(&pattern) else {
            continue;
        };

        let Some(raw) = line
            .captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            tracing::trace!(question_id = %question.id, "No answer line in reply");
            continue;
        };

        let answer = clean_answer(raw);

        if is_not_found(answer) {
            continue;
        }

        if answer.chars().count() <= min_len {
            tracing::trace!(question_id = %question.id, answer, "Answer too short");
            continue;
        }

        answers.push((question.id.clone(), answer.to_string()));
    }

    answers
}

/// Trims surrounding quotes, backticks and whitespace
pub(crate) fn clean_answer(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim()
}

fn is_not_found(answer: &str) -> bool {
    answer
        .trim_end_matches('.')
        .eq_ignore_ascii_case(NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![
            Question::new("01", "What is the contact email?"),
            Question::new("02", "Which certificate does the company hold?"),
            Question::new("10", "Where is the company located?"),
        ]
    }

    fn refs(questions: &[Question]) -> Vec<&Question> {
        questions.iter().collect()
    }

    #[test]
    fn test_parses_answer_lines() {
        let qs = questions();
        let reply = "01: kontakt@example.org\n02: NOT_FOUND\n10: Warsaw, Poland";
        let answers = parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN);

        assert_eq!(
            answers,
            vec![
                ("01".to_string(), "kontakt@example.org".to_string()),
                ("10".to_string(), "Warsaw, Poland".to_string()),
            ]
        );
    }

    #[test]
    fn test_id_match_is_anchored() {
        let qs = questions();
        // "10" must not be read from the "01" line and vice versa
        let reply = "  10 : `Gdańsk`\nnote 01: ignored";
        let answers = parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN);
        assert_eq!(answers, vec![("10".to_string(), "Gdańsk".to_string())]);
    }

    #[test]
    fn test_empty_answer_line_does_not_borrow_next_line() {
        let qs = questions();
        let reply = "01:\n02: kontakt@example.org";
        assert_eq!(
            parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN),
            vec![("02".to_string(), "kontakt@example.org".to_string())]
        );
    }

    #[test]
    fn test_rejects_short_answers() {
        let qs = questions();
        let reply = "01: n/a\n02: \"ISO\"";
        assert!(parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN).is_empty());
    }

    #[test]
    fn test_search_minimum_is_stricter() {
        let qs = questions();
        let reply = "10: Warsaw";
        assert_eq!(parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN).len(), 1);
        assert!(parse_page_answers(reply, &refs(&qs), SEARCH_MIN_ANSWER_LEN).is_empty());
    }

    #[test]
    fn test_fenced_reply_and_sentinel_variants() {
        let qs = questions();
        let reply = "```\n01: not_found.\n02: ISO 9001:2015\n```";
        assert_eq!(
            parse_page_answers(reply, &refs(&qs), PAGE_MIN_ANSWER_LEN),
            vec![("02".to_string(), "ISO 9001:2015".to_string())]
        );
    }

    #[test]
    fn test_garbage_reply_yields_nothing() {
        let qs = questions();
        assert!(parse_page_answers("I could not read the page.", &refs(&qs), 3).is_empty());
    }

    #[test]
    fn test_request_lists_questions() {
        let qs = questions();
        let request = build_extract_request(&refs(&qs), "https://example.org/", "Body");
        assert_eq!(request.task, OracleTask::ExtractAnswers);
        assert!(request.prompt.contains("01: What is the contact email?"));
        assert_eq!(request.documents, vec!["Source: https://example.org/\n\nBody"]);
    }
}
