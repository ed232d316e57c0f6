//! Variant pipeline - the per-variant retrieval/synthesis/scoring loop.
//!
//! One pipeline invocation consumes one query variant: for each
//! self-reflection iteration it retrieves evidence for the variant's
//! sub-queries, accumulates citations and context, synthesizes a draft
//! answer, and scores it. Later iterations refine the variant query and
//! synthesize from the larger accumulated context.

use crate::config::ExecutionParams;
use crate::ports::synthesis_gateway::{SynthesisError, SynthesisGateway};
use crate::resilience::{with_retries, CircuitBreaker, ResilienceError};
use crate::staged_search::StagedSearch;
use finqa_domain::citation::ensure_cited;
use finqa_domain::prompt::{PromptTemplate, SNIPPET_CHAR_CAP};
use finqa_domain::retrieval::{FilterStage, RetrievalFilter};
use finqa_domain::run::{
    IterationErrorInfo, IterationRecord, LlmCallMeta, RetrievalPlanEntry, VariantReport,
    VariantScore,
};
use finqa_domain::util::truncate_str;
use finqa_domain::{AgentError, OutputScorer, SubQuestionRoute};
use std::sync::Arc;
use tracing::{debug, info};

/// Early-exit accumulation targets within one iteration: once this many
/// distinct parents and context snippets are gathered, remaining sub-queries
/// are skipped (an optimization, not a correctness requirement).
const MIN_PARENTS_BEFORE_SKIP: usize = 2;
const MIN_SNIPPETS_BEFORE_SKIP: usize = 3;

/// One query variant, fully planned and ready to execute.
#[derive(Debug, Clone)]
pub struct VariantPlan {
    /// 1-based variant index; the original question is always v1.
    pub index: usize,
    pub query: String,
    pub sub_questions: Vec<String>,
    pub routes: Vec<SubQuestionRoute>,
    pub filter: RetrievalFilter,
}

fn map_synthesis_error(err: SynthesisError) -> AgentError {
    match err {
        SynthesisError::Auth(m) => AgentError::LlmAuth(m),
        SynthesisError::RateLimited(m) => AgentError::LlmRateLimit(m),
        SynthesisError::Connection(m) | SynthesisError::Api(m) => AgentError::LlmUnavailable(m),
    }
}

/// Executes variant pipelines. Shared read-only across variant tasks; the
/// breakers inside carry the only mutable state.
pub struct VariantPipeline {
    staged_search: StagedSearch,
    synthesis: Arc<dyn SynthesisGateway>,
    synthesis_breaker: Arc<CircuitBreaker>,
    scorer: Arc<dyn OutputScorer>,
    params: ExecutionParams,
}

impl VariantPipeline {
    pub fn new(
        staged_search: StagedSearch,
        synthesis: Arc<dyn SynthesisGateway>,
        synthesis_breaker: Arc<CircuitBreaker>,
        scorer: Arc<dyn OutputScorer>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            staged_search,
            synthesis,
            synthesis_breaker,
            scorer,
            params,
        }
    }

    /// Run the full iteration loop for one variant.
    pub async fn execute(&self, plan: &VariantPlan) -> Result<VariantReport, AgentError> {
        let variant_id = format!("v{}", plan.index);
        info!(variant = %variant_id, query = %plan.query, "variant pipeline start");

        let mut iterations: Vec<IterationRecord> = Vec::new();
        // Variant-scoped accumulators; they never shrink across iterations.
        let mut citations: Vec<String> = Vec::new();
        let mut context_notes: Vec<String> = Vec::new();

        'iterations: for loop_idx in 1..=self.params.self_reflection_iterations {
            let full_query = if loop_idx == 1 {
                plan.query.clone()
            } else {
                PromptTemplate::refined_query(&plan.query)
            };

            // Sub-questions first, then the full query unless it duplicates
            // the last sub-question.
            let mut sub_queries = plan.sub_questions.clone();
            if sub_queries.last() != Some(&full_query) {
                sub_queries.push(full_query);
            }

            let mut plan_entries: Vec<RetrievalPlanEntry> = Vec::new();
            let mut iteration_parents: Vec<String> = Vec::new();
            let mut total_hits = 0usize;

            for (sq_idx, sub_query) in sub_queries.iter().enumerate() {
                let outcome = self
                    .staged_search
                    .search(sub_query, self.params.top_k, &plan.filter)
                    .await?;
                total_hits += outcome.hits.len();

                let mut top_parents: Vec<String> = Vec::new();
                for hit in outcome.hits.iter().take(self.params.parents_per_attempt) {
                    if !top_parents.contains(&hit.parent_id) {
                        top_parents.push(hit.parent_id.clone());
                    }
                }

                plan_entries.push(RetrievalPlanEntry {
                    query: sub_query.clone(),
                    stage: outcome.stage,
                    hits: outcome.hits.len(),
                    top_parent_ids: top_parents.clone(),
                    action: "vector_search".to_string(),
                    latency_ms: outcome.latency_ms,
                });

                if loop_idx == 1 && sq_idx == 0 && outcome.is_empty() {
                    // Nothing retrievable even unfiltered: end the variant.
                    debug!(variant = %variant_id, "first retrieval empty; terminating variant");
                    iterations.push(IterationRecord {
                        iteration: loop_idx,
                        thought: format!("Iteration {loop_idx}: no hits at any stage"),
                        retrieval_plan: plan_entries,
                        output: String::new(),
                        actual_score: None,
                        llm_call: None,
                        error_info: Some(IterationErrorInfo::retrieval_empty(outcome.stage)),
                    });
                    break 'iterations;
                }

                for pid in &top_parents {
                    if !citations.contains(pid) {
                        citations.push(pid.clone());
                    }
                    if !iteration_parents.contains(pid) {
                        iteration_parents.push(pid.clone());
                    }
                }
                for hit in &outcome.hits {
                    if context_notes.len() >= self.params.max_context_snippets {
                        break;
                    }
                    let snippet = truncate_str(&hit.text, SNIPPET_CHAR_CAP).to_string();
                    if !snippet.is_empty() && !context_notes.contains(&snippet) {
                        context_notes.push(snippet);
                    }
                }

                if citations.len() >= MIN_PARENTS_BEFORE_SKIP
                    && context_notes.len() >= MIN_SNIPPETS_BEFORE_SKIP
                {
                    break;
                }
            }

            if total_hits == 0 {
                // A zero-hit iteration short-circuits the rest of the loop.
                let stage = plan_entries
                    .last()
                    .map(|e| e.stage)
                    .unwrap_or(FilterStage::Exhausted);
                iterations.push(IterationRecord {
                    iteration: loop_idx,
                    thought: format!("Iteration {loop_idx}: retrieval returned no hits"),
                    retrieval_plan: plan_entries,
                    output: String::new(),
                    actual_score: None,
                    llm_call: None,
                    error_info: Some(IterationErrorInfo::retrieval_empty(stage)),
                });
                break;
            }

            let system_prompt = PromptTemplate::synthesis_system();
            let user_prompt =
                PromptTemplate::synthesis_user(&plan.query, &citations, &context_notes);

            let completion = with_retries(
                || {
                    self.synthesis.complete(
                        system_prompt,
                        &user_prompt,
                        self.params.temperature,
                        self.params.max_tokens,
                    )
                },
                SynthesisError::is_retryable,
                &self.synthesis_breaker,
                &self.params.retry_policy(),
            )
            .await
            .map_err(|e| match e {
                ResilienceError::CircuitOpen => AgentError::CircuitOpen { call: "synthesis" },
                ResilienceError::Inner(err) => map_synthesis_error(err),
            })?;

            let answer = ensure_cited(completion.text.trim().to_string(), &citations);

            let actual_score = if self.params.enable_output_scoring {
                Some(
                    self.scorer
                        .score(&answer, &citations, &iteration_parents, &plan.query),
                )
            } else {
                None
            };

            debug!(
                variant = %variant_id,
                iteration = loop_idx,
                score = ?actual_score,
                citations = citations.len(),
                "iteration complete"
            );

            iterations.push(IterationRecord {
                iteration: loop_idx,
                thought: format!(
                    "Iteration {loop_idx}: {} retrieval attempts, {} context snippets",
                    plan_entries.len(),
                    context_notes.len()
                ),
                retrieval_plan: plan_entries,
                output: answer,
                actual_score,
                llm_call: Some(LlmCallMeta {
                    provider: completion.provider,
                    model: completion.model,
                    status: "success".to_string(),
                    usage: completion.usage,
                }),
                error_info: None,
            });
        }

        let mut report = VariantReport {
            variant_id: variant_id.clone(),
            query_variant: plan.query.clone(),
            sub_questions: plan.sub_questions.clone(),
            data_source_routing: plan.routes.clone(),
            iterations,
            variant_score: VariantScore {
                candidate_id: format!("cand-{variant_id}"),
                actual_score: None,
            },
        };
        report.variant_score.actual_score = report
            .best_scored_iteration()
            .and_then(|it| it.actual_score);

        info!(
            variant = %report.variant_id,
            score = ?report.variant_score.actual_score,
            iterations = report.iterations.len(),
            "variant pipeline done"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{plan_for, pipeline_with, EmptyRetrieval, ScriptedSynthesis, SingleHitRetrieval};
    use std::sync::Arc;

    #[tokio::test]
    async fn empty_first_retrieval_terminates_variant() {
        let pipeline = pipeline_with(
            Arc::new(EmptyRetrieval),
            Arc::new(ScriptedSynthesis::always("unused [doc-1]")),
            ExecutionParams::default(),
        );

        let report = pipeline.execute(&plan_for("anything at all")).await.unwrap();
        assert_eq!(report.iterations.len(), 1);
        let only = &report.iterations[0];
        assert!(only.output.is_empty());
        assert_eq!(only.error_info.as_ref().unwrap().code, "RETRIEVAL_EMPTY");
        assert!(report.variant_score.actual_score.is_none());
    }

    #[tokio::test]
    async fn scoring_disabled_leaves_scores_null() {
        let params = ExecutionParams::default()
            .with_output_scoring(false)
            .with_self_reflection_iterations(2);
        let pipeline = pipeline_with(
            Arc::new(SingleHitRetrieval::tesla()),
            Arc::new(ScriptedSynthesis::always(
                "Revenue was $24.6B in 2019 [tesla-10k-2019].",
            )),
            params,
        );

        let report = pipeline.execute(&plan_for("Tesla revenue 2019?")).await.unwrap();
        assert_eq!(report.iterations.len(), 2);
        assert!(report.iterations.iter().all(|it| it.actual_score.is_none()));
        assert!(report.variant_score.actual_score.is_none());
    }

    #[tokio::test]
    async fn uncited_draft_gets_first_whitelisted_citation() {
        let pipeline = pipeline_with(
            Arc::new(SingleHitRetrieval::tesla()),
            Arc::new(ScriptedSynthesis::always("Revenue was $24.6B in 2019.")),
            ExecutionParams::default().with_self_reflection_iterations(1),
        );

        let report = pipeline.execute(&plan_for("Tesla revenue 2019?")).await.unwrap();
        let output = &report.iterations[0].output;
        assert!(output.ends_with("[tesla-10k-2019]"), "got: {output}");
    }

    #[tokio::test]
    async fn iterations_accumulate_and_score() {
        let pipeline = pipeline_with(
            Arc::new(SingleHitRetrieval::tesla()),
            Arc::new(ScriptedSynthesis::always(
                "Revenue rose from 21,461 in 2018 to 24,578 in 2019 [tesla-10k-2019].",
            )),
            ExecutionParams::default().with_self_reflection_iterations(3),
        );

        let report = pipeline.execute(&plan_for("Tesla revenue 2019 vs 2018?")).await.unwrap();
        assert_eq!(report.iterations.len(), 3);
        assert!(report.variant_score.actual_score.unwrap() > 0.0);
        // Later iterations query the refined form of the variant.
        let second = &report.iterations[1];
        assert!(second.retrieval_plan
            .iter()
            .any(|e| e.query.contains("MD&A preference")));
    }
}
