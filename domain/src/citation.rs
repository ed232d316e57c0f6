//! Citation extraction and repair.
//!
//! Citations are bracketed parent-document identifiers like
//! `[tesla-10k-2019]` embedded in synthesized answers. The model is
//! instructed to cite only whitelisted ids, but drafts can still arrive with
//! the literal placeholder token or with no bracket at all; the helpers here
//! detect and repair both conditions.

use regex::Regex;
use std::sync::OnceLock;

/// Literal token a model emits when it could not fill in a real id.
pub const PLACEHOLDER_CITATION: &str = "[parent-id]";

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]+?)\]").unwrap())
}

/// Extract bracketed citation ids, deduplicated, first appearance order.
pub fn extract_citations(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for cap in bracket_regex().captures_iter(text) {
        let id = cap[1].to_string();
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Whether the text carries the literal placeholder token.
pub fn contains_placeholder(text: &str) -> bool {
    text.contains(PLACEHOLDER_CITATION)
}

/// Replace every placeholder occurrence with a real id.
pub fn replace_placeholder(text: &str, id: &str) -> String {
    text.replace(PLACEHOLDER_CITATION, &format!("[{id}]"))
}

/// Append the first whitelisted citation when a draft has no bracket at all.
///
/// Returns the draft unchanged when it already cites something or when the
/// whitelist is empty.
pub fn ensure_cited(answer: String, whitelist: &[String]) -> String {
    if answer.is_empty() || answer.contains('[') {
        return answer;
    }
    match whitelist.first() {
        Some(id) => format!("{answer} [{id}]"),
        None => answer,
    }
}
