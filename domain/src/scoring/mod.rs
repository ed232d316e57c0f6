//! Answer scoring.
//!
//! Scoring stays pluggable behind a named scoring-model identifier so that
//! an alternative rubric (or a model-graded judge) can be substituted
//! without touching the orchestrator. Every name currently resolves to the
//! heuristic rubric.

pub mod heuristic;

pub use heuristic::HeuristicRubric;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default scoring-model identifier.
pub const DEFAULT_SCORING_MODEL: &str = "heuristic_v1";

/// A strategy that scores a synthesized answer in the closed range [0, 5].
pub trait OutputScorer: Send + Sync {
    /// Identifier of this rubric.
    fn name(&self) -> &str;

    /// Scalar score for an answer. An empty answer scores exactly 0.0.
    fn score(&self, answer: &str, citations: &[String], allowed_ids: &[String], question: &str)
        -> f64;

    /// Per-facet diagnostic view of the same scoring pass.
    fn breakdown(
        &self,
        answer: &str,
        citations: &[String],
        allowed_ids: &[String],
        question: &str,
    ) -> ScoreBreakdown;
}

/// Diagnostic facets behind a scalar score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub ids_in_answer: Vec<String>,
    pub distinct_parent_ids: usize,
    pub has_numbers: bool,
    pub has_year_pair: bool,
    pub has_delta_language: bool,
    pub quoted_with_citation_count: usize,
    pub length: usize,
    pub sentence_like: bool,
    pub question_terms: Vec<String>,
    pub score: f64,
}

/// Resolve a scoring model by name.
///
/// Unrecognized names fall back to the heuristic rubric rather than failing
/// the run; the identifier is recorded in the report either way.
pub fn scorer_for(scoring_model: &str) -> Arc<dyn OutputScorer> {
    let _ = scoring_model;
    Arc::new(HeuristicRubric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_name_resolves_to_a_scorer() {
        let scorer = scorer_for("does-not-exist");
        assert_eq!(scorer.name(), DEFAULT_SCORING_MODEL);
    }
}
