//! Question value object

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Stopwords excluded from informative-term extraction.
const TERM_STOPWORDS: &[&str] = &[
    "with", "from", "that", "this", "those", "these", "which", "about", "into", "over", "under",
    "between", "among", "total", "year", "years",
];

/// Maximum informative terms considered by the scoring rubric.
const MAX_TERMS: usize = 8;

fn term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]{4,}").unwrap())
}

/// The user's question (Value Object).
///
/// Carries the original wording untouched; query variants and sub-questions
/// are derived from it but never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a new question.
    ///
    /// # Panics
    /// Panics if the content is empty or only whitespace.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        assert!(!content.trim().is_empty(), "question cannot be empty");
        Self { content }
    }

    /// Try to create a question, returning None if blank.
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Lowercase 4+ letter terms of the question, minus stopwords, capped at 8.
    ///
    /// Used by the scoring rubric's question-overlap facet.
    pub fn informative_terms(&self) -> Vec<String> {
        informative_terms(&self.content)
    }
}

/// Extract informative lowercase terms from free text.
pub fn informative_terms(text: &str) -> Vec<String> {
    term_regex()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|t| !TERM_STOPWORDS.contains(&t.as_str()))
        .take(MAX_TERMS)
        .collect()
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<&str> for Question {
    fn from(s: &str) -> Self {
        Question::new(s)
    }
}

impl From<String> for Question {
    fn from(s: String) -> Self {
        Question::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_creation() {
        let q = Question::new("What was Tesla's 2019 revenue?");
        assert_eq!(q.content(), "What was Tesla's 2019 revenue?");
    }

    #[test]
    #[should_panic]
    fn empty_question_panics() {
        Question::new("   ");
    }

    #[test]
    fn try_new_blank() {
        assert!(Question::try_new("").is_none());
        assert!(Question::try_new("What was revenue?").is_some());
    }

    #[test]
    fn terms_drop_stopwords_and_short_words() {
        let terms = informative_terms("What was the total revenue for that year?");
        assert!(terms.contains(&"revenue".to_string()));
        assert!(terms.contains(&"what".to_string()));
        assert!(!terms.contains(&"total".to_string()));
        assert!(!terms.contains(&"that".to_string()));
        // "was"/"the"/"for" are under 4 letters
        assert!(!terms.iter().any(|t| t.len() < 4));
    }

    #[test]
    fn terms_capped_at_eight() {
        let terms = informative_terms(
            "alpha beta gamma delta epsilon zeta theta lambda omega sigma extras",
        );
        assert_eq!(terms.len(), 8);
    }
}
