//! Compound-question decomposition.
//!
//! Splits a possibly compound question into 2-5 meaningful sub-questions
//! using, in priority order: explicit numbered-list markers, separator
//! splitting, and a colon-introduced comma list fallback. Routing of the
//! resulting sub-questions lives in [`routing`].

pub mod routing;

pub use routing::{route_sub_question, DataSource, RetrievalStrategy, SubQuestionRoute};

use regex::Regex;
use std::sync::OnceLock;

/// Minimum normalized fragment length to count as a sub-question.
const MIN_FRAGMENT_LEN: usize = 6;

/// Maximum sub-questions retained per question.
const MAX_SUB_QUESTIONS: usize = 5;

/// Fragments that are pure connective boilerplate.
const BOILERPLATE: &[&str] = &["and", "then", "followed by"];

/// Domain-signal keywords used to rank fragments when over budget.
const SIGNAL_KEYWORDS: &[&str] = &[
    "revenue", "income", "risk", "10-k", "10-q", "md&a", "margin", "segment", "guidance", "cash",
    "dividend", "filing", "growth", "expense", "earnings",
];

fn numbered_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+[.)]\s+").unwrap())
}

fn normalize(fragment: &str) -> String {
    fragment
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .trim_end_matches(|c: char| c == '?' || c == '.' || c.is_whitespace())
        .to_string()
}

fn is_meaningful(fragment: &str) -> bool {
    let lower = fragment.to_lowercase();
    fragment.len() >= MIN_FRAGMENT_LEN && !BOILERPLATE.contains(&lower.as_str())
}

/// Split on explicit numbered-list markers like `1.` / `2)`.
fn split_numbered(question: &str) -> Option<Vec<String>> {
    let markers: Vec<_> = numbered_marker_regex().find_iter(question).collect();
    if markers.len() < 2 {
        return None;
    }
    let mut parts = Vec::new();
    for (i, m) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(question.len(), |n| n.start());
        parts.push(question[m.end()..end].to_string());
    }
    Some(parts)
}

/// Split on `?`, `;`, then on conjunctions within each piece.
fn split_separators(question: &str) -> Vec<String> {
    let mut pieces: Vec<String> = question
        .split(['?', ';'])
        .map(str::to_string)
        .collect();

    for sep in [" and ", " & ", ", then ", "followed by"] {
        pieces = pieces
            .iter()
            .flat_map(|p| p.split(sep).map(str::to_string).collect::<Vec<_>>())
            .collect();
    }
    pieces
}

/// Fallback: a colon-introduced comma list ("Compare: revenue, risk, cash").
fn split_colon_list(question: &str) -> Option<Vec<String>> {
    let (_, tail) = question.split_once(':')?;
    let parts: Vec<String> = tail.split(',').map(str::to_string).collect();
    if parts.len() >= 2 {
        Some(parts)
    } else {
        None
    }
}

fn signal_count(fragment: &str) -> usize {
    let lower = fragment.to_lowercase();
    SIGNAL_KEYWORDS.iter().filter(|k| lower.contains(*k)).count()
}

/// Decompose a compound question into meaningful sub-questions.
///
/// Returns an empty vector when the question does not decompose (a single
/// fragment identical to the original is not a decomposition).
pub fn decompose(question: &str) -> Vec<String> {
    let raw = split_numbered(question)
        .or_else(|| {
            let parts = split_separators(question);
            if parts.len() > 1 {
                Some(parts)
            } else {
                None
            }
        })
        .or_else(|| split_colon_list(question))
        .unwrap_or_default();

    let mut fragments: Vec<String> = Vec::new();
    for part in raw {
        let cleaned = normalize(&part);
        if is_meaningful(&cleaned) && !fragments.contains(&cleaned) {
            fragments.push(cleaned);
        }
    }

    if fragments.len() == 1 && fragments[0] == normalize(question) {
        return Vec::new();
    }

    if fragments.len() > MAX_SUB_QUESTIONS {
        // Stable rank by domain-signal density, keep the strongest five.
        let mut ranked: Vec<(usize, String)> = fragments
            .into_iter()
            .map(|f| (signal_count(&f), f))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        fragments = ranked
            .into_iter()
            .take(MAX_SUB_QUESTIONS)
            .map(|(_, f)| f)
            .collect();
    }

    fragments
}

/// Decompose and assign each retained sub-question a retrieval route.
pub fn decompose_and_route(question: &str) -> (Vec<String>, Vec<SubQuestionRoute>) {
    let sub_questions = decompose(question);
    let routes = sub_questions
        .iter()
        .map(|sq| route_sub_question(sq))
        .collect();
    (sub_questions, routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_revenue_risk_question_splits() {
        let subs = decompose("What was 2019 revenue and what were the two risk factors?");
        assert!(subs.len() >= 2 && subs.len() <= 5, "got {subs:?}");
        assert!(subs
            .iter()
            .all(|s| s != "What was 2019 revenue and what were the two risk factors?"));
        assert!(subs.iter().any(|s| s.to_lowercase().contains("revenue")));
        assert!(subs.iter().any(|s| s.to_lowercase().contains("risk")));
    }

    #[test]
    fn simple_question_does_not_decompose() {
        assert!(decompose("What was Tesla's 2019 revenue?").is_empty());
    }

    #[test]
    fn numbered_list_takes_priority() {
        let subs = decompose("Answer these: 1. total revenue for 2019 2. main risk factors");
        assert_eq!(subs.len(), 2);
        assert!(subs[0].contains("revenue"));
        assert!(subs[1].contains("risk"));
    }

    #[test]
    fn colon_comma_fallback() {
        let subs = decompose("Compare for Tesla: revenue trends, liquidity position");
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn boilerplate_and_short_fragments_dropped() {
        let subs = decompose("revenue growth and then and what about cash flow?");
        assert!(subs.iter().all(|s| s.len() >= 6));
        assert!(!subs.iter().any(|s| s.to_lowercase() == "then"));
    }

    #[test]
    fn over_budget_keeps_strongest_five() {
        let subs = decompose(
            "revenue in 2019 and risk factors and md&a summary and segment margins and \
             cash position and the weather and the ceo's favorite color",
        );
        assert_eq!(subs.len(), 5);
        // Keyword-free fragments rank last and drop out first.
        assert!(!subs.iter().any(|s| s.contains("favorite color")));
    }
}
