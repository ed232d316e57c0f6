//! Deterministic query-variant generation.
//!
//! Variants are cheap textual paraphrases of the original question, produced
//! without any model call so that retrieval diversity is reproducible. Each
//! rule fires only when its trigger substring is present and the variant
//! budget has not been exhausted.

use regex::Regex;
use std::sync::OnceLock;

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap())
}

/// Expand the first bare year into a fiscal-year phrase, if any.
fn fiscal_year_variant(question: &str) -> Option<String> {
    let m = year_regex().find(question)?;
    // Skip years already written as "FY <year>"
    if question[..m.start()].trim_end().ends_with("FY") {
        return None;
    }
    let mut out = String::with_capacity(question.len() + 3);
    out.push_str(&question[..m.start()]);
    out.push_str("FY ");
    out.push_str(m.as_str());
    out.push_str(&question[m.end()..]);
    Some(out)
}

/// ASCII-case-insensitive substring search, in byte offsets of `question`.
///
/// Lowercasing the haystack first would shift offsets for characters whose
/// lowercase form has a different byte length, so the scan stays in the
/// original string's coordinates.
fn find_trigger(question: &str, trigger: &str) -> Option<usize> {
    let needle = trigger.as_bytes();
    question.char_indices().map(|(i, _)| i).find(|&i| {
        question
            .as_bytes()
            .get(i..i + needle.len())
            .map_or(false, |window| window.eq_ignore_ascii_case(needle))
    })
}

/// Replace a case-insensitively matched trigger phrase, preserving surrounding text.
fn substitute(question: &str, trigger: &str, replacement: &str) -> Option<String> {
    let pos = find_trigger(question, trigger)?;
    let mut out = String::with_capacity(question.len());
    out.push_str(&question[..pos]);
    out.push_str(replacement);
    out.push_str(&question[pos + trigger.len()..]);
    Some(out)
}

/// Generate up to `max_variants` deterministic paraphrases.
///
/// Output excludes duplicates and the original question itself.
pub fn generate_variants(question: &str, max_variants: usize) -> Vec<String> {
    let question = question.trim();
    if question.is_empty() || max_variants == 0 {
        return Vec::new();
    }

    let mut out: Vec<String> = Vec::new();
    let push = |candidate: Option<String>, out: &mut Vec<String>| {
        if out.len() >= max_variants {
            return;
        }
        if let Some(v) = candidate {
            if v != question && !out.contains(&v) {
                out.push(v);
            }
        }
    };

    push(fiscal_year_variant(question), &mut out);
    push(
        substitute(question, "total revenue", "revenue (total)"),
        &mut out,
    );
    push(
        substitute(question, "latest filing", "most recent annual report"),
        &mut out,
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_year_becomes_fiscal_year() {
        let variants = generate_variants("Tesla total revenue 2019 vs 2018?", 3);
        assert!(variants.contains(&"Tesla total revenue FY 2019 vs 2018?".to_string()));
    }

    #[test]
    fn already_fiscal_year_is_skipped() {
        let variants = generate_variants("Tesla revenue FY 2019?", 3);
        assert!(variants.iter().all(|v| !v.contains("FY FY")));
    }

    #[test]
    fn phrase_rules_fire_on_triggers() {
        let variants = generate_variants("What was Total Revenue in the latest filing?", 3);
        assert!(variants
            .iter()
            .any(|v| v.contains("revenue (total)")));
        assert!(variants
            .iter()
            .any(|v| v.contains("most recent annual report")));
    }

    #[test]
    fn budget_is_respected() {
        let variants = generate_variants("total revenue for 2019 in the latest filing", 1);
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn no_triggers_no_variants() {
        assert!(generate_variants("Describe the company's strategy", 3).is_empty());
    }

    #[test]
    fn multibyte_question_with_trigger_at_end_does_not_panic() {
        // "İ" lowercases to two chars, so lowercased offsets diverge from
        // the original string's byte offsets.
        let variants = generate_variants("İstanbul total revenue", 3);
        assert!(variants.contains(&"İstanbul revenue (total)".to_string()));
    }

    #[test]
    fn multibyte_prefix_keeps_surrounding_text_intact() {
        let variants = generate_variants("İstanbul total revenue and latest filing?", 3);
        assert!(variants.contains(&"İstanbul revenue (total) and latest filing?".to_string()));
        assert!(
            variants.contains(&"İstanbul total revenue and most recent annual report?".to_string())
        );
    }

    #[test]
    fn deterministic() {
        let q = "Tesla total revenue 2019 vs 2018?";
        assert_eq!(generate_variants(q, 3), generate_variants(q, 3));
    }
}
