//! Keyword classification of questions
//!
//! The kind decides which regex battery the pattern tier runs, which query
//! templates web search uses, and whether an answer may later be refined.

use crate::questions::Question;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of question kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// An e-mail address
    ContactAddress,
    /// A URL, usually pointing at a document or another site
    ExternalResourceLink,
    /// A certificate or standard identifier such as "ISO 9001:2015"
    CertificationCode,
    General,
}

const CONTACT_KEYWORDS: &[&str] = &[
    "email",
    "e-mail",
    "mail address",
    "adres e-mail",
    "adres email",
    "mailowy",
    "poczta",
];

const LINK_KEYWORDS: &[&str] = &[
    "url",
    "link",
    "website",
    "web page",
    "webpage",
    "homepage",
    "hyperlink",
    "odnośnik",
    "adres strony",
    "strona internetowa",
    "strony internetowej",
];

const CERTIFICATION_KEYWORDS: &[&str] = &[
    "certif",
    "certyfik",
    "accredit",
    "akredyt",
    "quality standard",
    "management standard",
    "standard number",
    "norma jakości",
    "numer normy",
];

/// Matched only as complete words ("iso" but not "isolation")
const CERTIFICATION_WORDS: &[&str] = &["iso", "iatf", "ohsas"];

impl QuestionKind {
    /// Lowercase keywords that select this kind
    ///
    /// Single words match the start of a word in the question, so "certif"
    /// covers "certificate" and "certification". Phrases match anywhere.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::ContactAddress => CONTACT_KEYWORDS,
            Self::ExternalResourceLink => LINK_KEYWORDS,
            Self::CertificationCode => CERTIFICATION_KEYWORDS,
            Self::General => &[],
        }
    }

    /// Lowercase words that select this kind only when they appear whole
    pub fn whole_words(self) -> &'static [&'static str] {
        match self {
            Self::CertificationCode => CERTIFICATION_WORDS,
            _ => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContactAddress => "contact-address",
            Self::ExternalResourceLink => "external-resource-link",
            Self::CertificationCode => "certification-code",
            Self::General => "general",
        }
    }

    /// Returns true if `text` mentions one of this kind's keywords
    pub fn matches(self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let words = words(&lowered);

        let by_keyword = self.keywords().iter().any(|keyword| {
            if keyword.contains(' ') {
                lowered.contains(keyword)
            } else {
                words.iter().any(|word| word.starts_with(keyword))
            }
        });

        by_keyword
            || self
                .whole_words()
                .iter()
                .any(|whole| words.iter().any(|word| is_whole_word(word, whole)))
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a question by keyword
///
/// Kinds are tried in a fixed order: contact address, link, certification.
/// "What is the URL of the ISO certificate?" is therefore a link question.
pub fn classify(question: &Question) -> QuestionKind {
    [
        QuestionKind::ContactAddress,
        QuestionKind::ExternalResourceLink,
        QuestionKind::CertificationCode,
    ]
    .into_iter()
    .find(|kind| kind.matches(&question.text))
    .unwrap_or(QuestionKind::General)
}

/// Words of at least four letters that are not common filler
///
/// Used to match link labels against the question.
pub fn significant_words(text: &str) -> Vec<String> {
    const STOPWORDS: &[&str] = &[
        "what", "which", "where", "when", "does", "that", "this", "with", "from", "have", "their",
        "there", "about", "company", "jaki", "jaka", "jakie", "gdzie", "który", "która", "firma",
        "firmy", "oraz", "jest",
    ];

    words(&text.to_lowercase())
        .into_iter()
        .filter(|word| word.chars().count() >= 4 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// "iso" matches "iso" and "iso-9001" but not "isolation"
fn is_whole_word(word: &str, whole: &str) -> bool {
    word.strip_prefix(whole)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

fn words(lowered: &str) -> Vec<String> {
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}
