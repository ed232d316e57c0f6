//! Heuristic scoring rubric.
//!
//! Sums independent sub-scores on a 0..10 internal scale, then rescales by
//! 0.5 into the closed range [0, 5]:
//!
//! 1. Citation coverage (0..2): +1 for >=1 bracketed citation, +1 for >=2.
//! 2. Distinct parents (0..1): +1 for >=2 distinct citation values.
//! 3. Numeric completeness (0..2): +1 for any digits, +1 for a 2019/2018
//!    year pair alongside a digit (year-over-year proxy).
//! 4. Delta language (0..1): +1 for comparison vocabulary.
//! 5. Quoted evidence (0..2): +1 per quoted segment immediately followed by
//!    a citation, capped at 2.
//! 6. Length/fluency (0..1): +0.5 for 200..=1400 chars, +0.5 for >=3 periods.
//! 7. Question overlap (0..1): +1 if any informative question term appears.
//!
//! Result is clamped to [0, 5] and rounded to 3 decimal places.

use super::{OutputScorer, ScoreBreakdown, DEFAULT_SCORING_MODEL};
use crate::citation::extract_citations;
use crate::core::question::informative_terms;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const DELTA_VOCABULARY: &[&str] = &[
    "increase",
    "decrease",
    "delta",
    "change",
    "rose",
    "declined",
    "up ",
    "down ",
    "grew",
    "reduction",
    "∆",
];

fn digit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,.]*").unwrap())
}

fn quoted_cite_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+?)"\s*\[[^\[\]]+?\]"#).unwrap())
}

fn has_numbers(text: &str) -> bool {
    digit_regex().is_match(text)
}

fn has_year_pair(text: &str) -> bool {
    text.contains("2019") && text.contains("2018") && text.chars().any(|c| c.is_ascii_digit())
}

fn has_delta_language(text: &str) -> bool {
    let lower = text.to_lowercase();
    DELTA_VOCABULARY.iter().any(|kw| lower.contains(kw))
}

fn quoted_with_citation_count(text: &str) -> usize {
    quoted_cite_regex().find_iter(text).count()
}

fn sentence_like(text: &str) -> bool {
    text.matches('.').count() >= 3
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// The default, intentionally approximate rubric (`heuristic_v1`).
pub struct HeuristicRubric;

impl OutputScorer for HeuristicRubric {
    fn name(&self) -> &str {
        DEFAULT_SCORING_MODEL
    }

    fn score(
        &self,
        answer: &str,
        _citations: &[String],
        _allowed_ids: &[String],
        question: &str,
    ) -> f64 {
        if answer.is_empty() {
            return 0.0;
        }

        let mut total = 0.0_f64;

        // (1) Citation coverage
        let ids = extract_citations(answer);
        if !ids.is_empty() {
            total += 1.0;
        }
        if ids.len() >= 2 {
            total += 1.0;
        }

        // (2) Distinct parent ids
        let distinct: BTreeSet<&String> = ids.iter().collect();
        if distinct.len() >= 2 {
            total += 1.0;
        }

        // (3) Numeric completeness
        if has_numbers(answer) {
            total += 1.0;
        }
        if has_year_pair(answer) {
            total += 1.0;
        }

        // (4) Delta language
        if has_delta_language(answer) {
            total += 1.0;
        }

        // (5) Quoted evidence with citations
        let quoted = quoted_with_citation_count(answer);
        if quoted >= 1 {
            total += 1.0;
        }
        if quoted >= 2 {
            total += 1.0;
        }

        // (6) Length and fluency
        let len = answer.len();
        if (200..=1400).contains(&len) {
            total += 0.5;
        }
        if sentence_like(answer) {
            total += 0.5;
        }

        // (7) Question-term overlap
        let lower_answer = answer.to_lowercase();
        let terms = informative_terms(question);
        if !terms.is_empty() && terms.iter().any(|t| lower_answer.contains(t)) {
            total += 1.0;
        }

        round3((total / 10.0 * 5.0).clamp(0.0, 5.0))
    }

    fn breakdown(
        &self,
        answer: &str,
        citations: &[String],
        allowed_ids: &[String],
        question: &str,
    ) -> ScoreBreakdown {
        let ids = extract_citations(answer);
        let distinct: BTreeSet<&String> = ids.iter().collect();
        ScoreBreakdown {
            distinct_parent_ids: distinct.len(),
            has_numbers: has_numbers(answer),
            has_year_pair: has_year_pair(answer),
            has_delta_language: has_delta_language(answer),
            quoted_with_citation_count: quoted_with_citation_count(answer),
            length: answer.len(),
            sentence_like: sentence_like(answer),
            question_terms: informative_terms(question),
            score: self.score(answer, citations, allowed_ids, question),
            ids_in_answer: ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(answer: &str, question: &str) -> f64 {
        HeuristicRubric.score(answer, &[], &[], question)
    }

    #[test]
    fn empty_answer_scores_zero() {
        assert_eq!(score("", "What was 2019 revenue?"), 0.0);
    }

    #[test]
    fn one_citation_scores_above_uncited() {
        let uncited = "Revenue was $24.6 billion in 2019.";
        let cited = "Revenue was $24.6 billion in 2019 [tesla-10k-2019].";
        assert!(score(cited, "revenue?") > score(uncited, "revenue?"));
    }

    #[test]
    fn adding_a_second_distinct_citation_never_decreases() {
        let one = "Revenue grew in 2019 versus 2018 [tesla-10k-2019].";
        let two = "Revenue grew in 2019 versus 2018 [tesla-10k-2019] [tesla-10k-2018].";
        assert!(score(two, "revenue growth?") >= score(one, "revenue growth?"));
    }

    #[test]
    fn year_pair_with_digits_earns_numeric_bonus() {
        let single = "Revenue was 24,578 in 2019 [a].";
        let pair = "Revenue was 24,578 in 2019 versus 21,461 in 2018 [a].";
        assert!(score(pair, "revenue?") > score(single, "revenue?"));
    }

    #[test]
    fn quoted_risk_evidence_counts() {
        let answer = r#"The filing warns "demand may fluctuate" [tesla-10k-2019] and "competition is intense" [tesla-10k-2019]."#;
        assert_eq!(quoted_with_citation_count(answer), 2);
    }

    #[test]
    fn score_is_rounded_and_clamped() {
        let answer = r#"Revenue increased from 21,461 in 2018 to 24,578 in 2019, a change of 3,117 [tesla-10k-2019] [tesla-10k-2018]. The filing notes "demand may fluctuate" [tesla-10k-2019]. It also warns "competition is intense" [tesla-10k-2018]. Management discussed growth drivers in the MD&A section at length, including vehicle deliveries and energy storage deployments across both years."#;
        let s = score(answer, "What was Tesla revenue change 2019 vs 2018?");
        assert!((0.0..=5.0).contains(&s));
        assert_eq!(s, round3(s));
        // Hits every facet: full marks.
        assert_eq!(s, 5.0);
    }

    #[test]
    fn breakdown_matches_score() {
        let answer = "Revenue rose in 2019 [tesla-10k-2019].";
        let b = HeuristicRubric.breakdown(answer, &[], &[], "revenue in 2019?");
        assert_eq!(b.ids_in_answer, vec!["tesla-10k-2019".to_string()]);
        assert_eq!(b.score, score(answer, "revenue in 2019?"));
        assert!(b.has_numbers);
        assert!(!b.has_year_pair);
    }
}
