//! Corpus inference: static knowledge first, then the oracle

use crate::config::StaticAnswer;
use crate::oracle::{strip_code_fence, OracleRequest, OracleTask, CANNOT_INFER, NOT_FOUND};
use crate::questions::Question;
use crate::strategy::classify::QuestionKind;
use crate::strategy::page_answer::clean_answer;

/// Inferred answers must be longer than this
pub const MIN_INFERENCE_LEN: usize = 5;

/// Returns the first configured answer that applies to the question
///
/// An entry applies when its kind (if set) equals the question's kind and every
/// one of its keywords occurs in the question text, ignoring case.
pub fn static_answer<'a>(
    question: &Question,
    kind: QuestionKind,
    entries: &'a [StaticAnswer],
) -> Option<&'a str> {
    let text = question.text.to_lowercase();

    entries
        .iter()
        .find(|entry| {
            entry.kind.map_or(true, |k| k == kind)
                && !entry.keywords.is_empty()
                && entry
                    .keywords
                    .iter()
                    .all(|keyword| text.contains(&keyword.to_lowercase()))
        })
        .map(|entry| entry.answer.as_str())
}

pub fn build_infer_request(question: &Question, corpus_text: &str) -> OracleRequest {
    let prompt = format!(
        "Question: {}\n\nThe document below is everything collected from the organisation's website.\n\
         Answer the question from it, using general domain knowledge only to connect facts that the \
         document supports. Reply with the answer alone. If the answer cannot be inferred, reply {}.",
        question.text, CANNOT_INFER
    );

    OracleRequest::new(OracleTask::InferAnswer, prompt).with_document(corpus_text)
}

/// Accepts an inference reply unless it is a sentinel or too short
pub fn parse_inference(reply: &str) -> Option<String> {
    let answer = clean_answer(strip_code_fence(reply));

    if answer.contains(CANNOT_INFER) || answer.contains(NOT_FOUND) {
        return None;
    }
    if answer.chars().count() <= MIN_INFERENCE_LEN {
        return None;
    }

    Some(answer.to_string())
}
