//! Run, variant, and iteration trace records.
//!
//! These are the envelope types a run returns. They are never persisted;
//! downstream presentation layers may render or redact them.

use crate::citation::extract_citations;
use crate::decompose::SubQuestionRoute;
use crate::retrieval::FilterStage;
use serde::{Deserialize, Serialize};

/// Aggregated prompt/completion token counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn accumulate(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Metadata for one language-model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallMeta {
    pub provider: String,
    pub model: String,
    pub status: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// One retrieval attempt within an iteration. Immutable once logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalPlanEntry {
    pub query: String,
    pub stage: FilterStage,
    pub hits: usize,
    /// Up to 3 distinct parent ids from the top hits.
    pub top_parent_ids: Vec<String>,
    pub action: String,
    pub latency_ms: u64,
}

/// Error descriptor attached to a failed iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationErrorInfo {
    pub code: String,
    pub stage: FilterStage,
}

impl IterationErrorInfo {
    pub fn retrieval_empty(stage: FilterStage) -> Self {
        Self {
            code: "RETRIEVAL_EMPTY".to_string(),
            stage,
        }
    }
}

/// One self-reflection pass within a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration index.
    pub iteration: usize,
    pub thought: String,
    pub retrieval_plan: Vec<RetrievalPlanEntry>,
    /// Synthesized answer text; empty when the iteration failed.
    pub output: String,
    pub actual_score: Option<f64>,
    pub llm_call: Option<LlmCallMeta>,
    pub error_info: Option<IterationErrorInfo>,
}

impl IterationRecord {
    /// Citations present in this iteration's output.
    pub fn citations(&self) -> Vec<String> {
        extract_citations(&self.output)
    }
}

/// The best score among a variant's iterations, with a candidate id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantScore {
    pub candidate_id: String,
    pub actual_score: Option<f64>,
}

/// Full trace of one query variant's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub variant_id: String,
    pub query_variant: String,
    pub sub_questions: Vec<String>,
    pub data_source_routing: Vec<SubQuestionRoute>,
    pub iterations: Vec<IterationRecord>,
    pub variant_score: VariantScore,
}

impl VariantReport {
    /// Best-scoring iteration; the later iteration wins score ties since it
    /// synthesized from more accumulated context.
    pub fn best_scored_iteration(&self) -> Option<&IterationRecord> {
        let mut best: Option<&IterationRecord> = None;
        for record in &self.iterations {
            let Some(score) = record.actual_score else {
                continue;
            };
            match best.and_then(|b| b.actual_score) {
                Some(best_score) if score < best_score => {}
                _ => best = Some(record),
            }
        }
        best
    }

    /// Iteration the selection step treats as this variant's answer:
    /// the best-scoring one, else the first one carrying a citation.
    pub fn representative_iteration(&self) -> Option<&IterationRecord> {
        self.best_scored_iteration()
            .or_else(|| self.iterations.iter().find(|it| !it.citations().is_empty()))
    }

    /// Whether any iteration's output carries a citation.
    pub fn has_cited_iteration(&self) -> bool {
        self.iterations.iter().any(|it| !it.citations().is_empty())
    }

    /// Token usage summed over every iteration's LLM call.
    pub fn token_usage(&self) -> TokenUsage {
        let mut usage = TokenUsage::default();
        for record in &self.iterations {
            if let Some(call) = &record.llm_call {
                usage.accumulate(call.usage);
            }
        }
        usage
    }
}

/// Success envelope for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub question: String,
    pub final_response: String,
    pub citations: Vec<String>,
    pub scoring_model: String,
    pub selected_variant_id: String,
    pub selected_candidate_id: String,
    pub selected_score: Option<f64>,
    pub ranking_rationale: String,
    /// Per-variant trace detail; emptied when traces are not emitted.
    pub variants: Vec<VariantReport>,
    pub answer_timestamp: String,
    pub elapsed_ms: u64,
    pub token_usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration(index: usize, output: &str, score: Option<f64>) -> IterationRecord {
        IterationRecord {
            iteration: index,
            thought: format!("Iteration {index}"),
            retrieval_plan: vec![],
            output: output.to_string(),
            actual_score: score,
            llm_call: None,
            error_info: None,
        }
    }

    fn report(iterations: Vec<IterationRecord>) -> VariantReport {
        VariantReport {
            variant_id: "v1".into(),
            query_variant: "q".into(),
            sub_questions: vec![],
            data_source_routing: vec![],
            iterations,
            variant_score: VariantScore {
                candidate_id: "cand-v1".into(),
                actual_score: None,
            },
        }
    }

    #[test]
    fn best_scored_prefers_later_iteration_on_ties() {
        let r = report(vec![
            iteration(1, "a [doc-1]", Some(2.5)),
            iteration(2, "b [doc-1]", Some(2.5)),
            iteration(3, "c", None),
        ]);
        assert_eq!(r.best_scored_iteration().unwrap().iteration, 2);
    }

    #[test]
    fn representative_falls_back_to_first_cited() {
        let r = report(vec![
            iteration(1, "no citation here", None),
            iteration(2, "evidence [doc-2]", None),
        ]);
        assert_eq!(r.representative_iteration().unwrap().iteration, 2);
        assert!(r.has_cited_iteration());
    }

    #[test]
    fn no_scores_no_citations_yields_none() {
        let r = report(vec![iteration(1, "bare text", None)]);
        assert!(r.representative_iteration().is_none());
    }

    #[test]
    fn usage_sums_across_iterations() {
        let mut a = iteration(1, "x", Some(1.0));
        a.llm_call = Some(LlmCallMeta {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            status: "success".into(),
            usage: TokenUsage::new(100, 20),
        });
        let mut b = iteration(2, "y", Some(2.0));
        b.llm_call = Some(LlmCallMeta {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            status: "success".into(),
            usage: TokenUsage::new(50, 10),
        });
        let usage = report(vec![a, b]).token_usage();
        assert_eq!(usage.prompt_tokens, 150);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens(), 180);
    }
}
