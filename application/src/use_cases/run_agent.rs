//! Run Agent use case
//!
//! Orchestrates a full question-answering run: builds the variant list,
//! decomposes and routes each variant, fans the variant pipelines out,
//! selects the best result, and enforces the citation contract before
//! returning the success envelope.

use crate::config::{ExecutionMode, ExecutionParams};
use crate::ports::retrieval_gateway::RetrievalGateway;
use crate::ports::synthesis_gateway::SynthesisGateway;
use crate::resilience::CircuitBreaker;
use crate::staged_search::StagedSearch;
use crate::use_cases::variant_pipeline::{VariantPipeline, VariantPlan};
use chrono::Utc;
use finqa_domain::citation::{contains_placeholder, extract_citations, replace_placeholder};
use finqa_domain::retrieval::RetrievalFilter;
use finqa_domain::run::{RunReport, VariantReport};
use finqa_domain::scoring::{scorer_for, DEFAULT_SCORING_MODEL};
use finqa_domain::{
    decompose_and_route, generate_variants, AgentError, Question, PLACEHOLDER_CITATION,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Input for the RunAgent use case.
#[derive(Debug, Clone)]
pub struct RunAgentInput {
    /// The question to answer.
    pub question: Question,
    /// Named scoring strategy; unrecognized names fall back to the heuristic.
    pub scoring_model: String,
    /// Whether the envelope carries per-variant trace detail.
    pub emit_traces: bool,
    pub execution_mode: ExecutionMode,
    /// Fiscal-year preference merged into every variant's filter.
    pub preferred_year: Option<String>,
    /// Caller-supplied metadata filter, normalized on insert.
    pub retrieval_filters: RetrievalFilter,
    pub params: ExecutionParams,
}

impl RunAgentInput {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            scoring_model: DEFAULT_SCORING_MODEL.to_string(),
            emit_traces: true,
            execution_mode: ExecutionMode::Parallel,
            preferred_year: None,
            retrieval_filters: RetrievalFilter::new(),
            params: ExecutionParams::default(),
        }
    }

    pub fn with_scoring_model(mut self, model: impl Into<String>) -> Self {
        self.scoring_model = model.into();
        self
    }

    pub fn without_traces(mut self) -> Self {
        self.emit_traces = false;
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_preferred_year(mut self, year: impl Into<String>) -> Self {
        self.preferred_year = Some(year.into());
        self
    }

    pub fn with_filters(mut self, filters: RetrievalFilter) -> Self {
        self.retrieval_filters = filters;
        self
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }
}

/// Use case for running the cited question-answering agent.
pub struct RunAgentUseCase<R: RetrievalGateway + 'static, S: SynthesisGateway + 'static> {
    retrieval: Arc<R>,
    synthesis: Arc<S>,
}

impl<R: RetrievalGateway + 'static, S: SynthesisGateway + 'static> RunAgentUseCase<R, S> {
    pub fn new(retrieval: Arc<R>, synthesis: Arc<S>) -> Self {
        Self {
            retrieval,
            synthesis,
        }
    }

    /// Execute one full run.
    pub async fn execute(&self, input: RunAgentInput) -> Result<RunReport, AgentError> {
        let started = Instant::now();
        let params = input.params.clone();

        let mut filter = input.retrieval_filters.clone();
        if let Some(year) = &input.preferred_year {
            filter.merge_year(year);
        }

        let plans = build_plans(&input, &filter);
        info!(
            question = input.question.content(),
            variants = plans.len(),
            mode = ?input.execution_mode,
            "run start"
        );

        // Run-scoped breakers, one per external-call type, shared across
        // every variant task.
        let retrieval_breaker = Arc::new(CircuitBreaker::new(
            params.retrieval_failure_threshold,
            params.retrieval_recovery_time,
        ));
        let synthesis_breaker = Arc::new(CircuitBreaker::new(
            params.synthesis_failure_threshold,
            params.synthesis_recovery_time,
        ));
        let staged = StagedSearch::new(
            Arc::clone(&self.retrieval) as Arc<dyn RetrievalGateway>,
            retrieval_breaker,
            params.retry_policy(),
        );
        let pipeline = Arc::new(VariantPipeline::new(
            staged,
            Arc::clone(&self.synthesis) as Arc<dyn SynthesisGateway>,
            synthesis_breaker,
            scorer_for(&input.scoring_model),
            params.clone(),
        ));

        let reports = match input.execution_mode {
            ExecutionMode::Parallel => run_parallel(pipeline, plans).await?,
            ExecutionMode::Sequential => run_sequential(pipeline, plans).await?,
        };

        let selected_idx = select_best(&reports);
        let (selected_idx, rationale) = match selected_idx {
            Some(idx) => {
                let report = &reports[idx];
                (
                    idx,
                    format!(
                        "variant {} scored {:.3}; ties broken by citation count, then iteration depth",
                        report.variant_id,
                        report.variant_score.actual_score.unwrap_or(0.0)
                    ),
                )
            }
            None => {
                // Last resort: the first variant with any cited iteration.
                let idx = reports
                    .iter()
                    .position(|r| r.has_cited_iteration())
                    .ok_or_else(|| AgentError::RetrievalEmpty {
                        top_k: params.top_k,
                        filters: filter.clone(),
                    })?;
                (
                    idx,
                    format!(
                        "no variant produced a score; selected first variant with a cited iteration ({})",
                        reports[idx].variant_id
                    ),
                )
            }
        };

        let selected = &reports[selected_idx];
        let representative = selected
            .representative_iteration()
            .ok_or_else(|| AgentError::RetrievalEmpty {
                top_k: params.top_k,
                filters: filter.clone(),
            })?;
        let mut answer = representative.output.clone();

        if contains_placeholder(&answer) {
            let replacement =
                first_real_citation(selected).ok_or_else(|| AgentError::PlaceholderCitations {
                    filters: filter.clone(),
                })?;
            debug!(citation = %replacement, "repairing placeholder citation");
            answer = replace_placeholder(&answer, &replacement);
        }

        let citations = extract_citations(&answer);
        if citations.is_empty() {
            return Err(AgentError::InsufficientEvidence {
                top_k: params.top_k,
                filters: filter,
            });
        }

        let token_usage = selected.token_usage();
        let report = RunReport {
            run_id: new_run_id(),
            question: input.question.content().to_string(),
            final_response: answer,
            citations,
            scoring_model: input.scoring_model.clone(),
            selected_variant_id: selected.variant_id.clone(),
            selected_candidate_id: selected.variant_score.candidate_id.clone(),
            selected_score: selected.variant_score.actual_score,
            ranking_rationale: rationale,
            variants: if input.emit_traces {
                reports
            } else {
                Vec::new()
            },
            answer_timestamp: Utc::now().to_rfc3339(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            token_usage,
        };

        info!(
            run_id = %report.run_id,
            selected = %report.selected_variant_id,
            score = ?report.selected_score,
            elapsed_ms = report.elapsed_ms,
            "run complete"
        );
        Ok(report)
    }
}

/// Build one pipeline plan per de-duplicated variant query.
fn build_plans(input: &RunAgentInput, filter: &RetrievalFilter) -> Vec<VariantPlan> {
    let question = input.question.content().trim().to_string();
    let mut queries = vec![question.clone()];
    if input.params.enable_query_variants {
        for variant in generate_variants(&question, input.params.max_variants) {
            if !queries.contains(&variant) {
                queries.push(variant);
            }
        }
    }

    queries
        .into_iter()
        .enumerate()
        .map(|(i, query)| {
            let (sub_questions, routes) = decompose_and_route(&query);
            VariantPlan {
                index: i + 1,
                query,
                sub_questions,
                routes,
                filter: filter.clone(),
            }
        })
        .collect()
}

async fn run_parallel(
    pipeline: Arc<VariantPipeline>,
    plans: Vec<VariantPlan>,
) -> Result<Vec<VariantReport>, AgentError> {
    let mut join_set = JoinSet::new();

    for plan in plans {
        let pipeline = Arc::clone(&pipeline);
        join_set.spawn(async move {
            let index = plan.index;
            (index, pipeline.execute(&plan).await)
        });
    }

    let mut indexed = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, Ok(report))) => indexed.push((index, report)),
            Ok((index, Err(err))) => {
                // Fail fast: one variant's typed failure aborts the batch;
                // dropping the join set cancels the in-flight siblings.
                warn!(variant = index, %err, "variant pipeline failed; aborting run");
                return Err(err);
            }
            Err(err) => {
                // A panicked variant task aborts the batch the same way a
                // typed failure does; a partial selection would be wrong.
                warn!(%err, "variant task crashed; aborting run");
                return Err(AgentError::Internal(format!("variant task failed: {err}")));
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, report)| report).collect())
}

async fn run_sequential(
    pipeline: Arc<VariantPipeline>,
    plans: Vec<VariantPlan>,
) -> Result<Vec<VariantReport>, AgentError> {
    let mut reports = Vec::with_capacity(plans.len());
    for plan in &plans {
        reports.push(pipeline.execute(plan).await?);
    }
    Ok(reports)
}

/// Pick the scored variant to answer with.
///
/// Highest score wins; ties go to the variant whose best iteration cites
/// more distinct parents, then to the deeper iteration. Unscored variants
/// are never selected here.
fn select_best(reports: &[VariantReport]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, report) in reports.iter().enumerate() {
        let Some(score) = report.variant_score.actual_score else {
            continue;
        };
        let better = match best {
            None => true,
            Some((best_idx, best_score)) => {
                if score > best_score {
                    true
                } else if score < best_score {
                    false
                } else {
                    tie_key(report) > tie_key(&reports[best_idx])
                }
            }
        };
        if better {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

fn tie_key(report: &VariantReport) -> (usize, usize) {
    match report.best_scored_iteration() {
        Some(it) => (it.citations().len(), it.iteration),
        None => (0, 0),
    }
}

/// First non-placeholder citation the variant gathered, searching iteration
/// outputs in order, then the retrieval-plan parent ids.
fn first_real_citation(report: &VariantReport) -> Option<String> {
    let is_real = |c: &str| format!("[{c}]") != PLACEHOLDER_CITATION;

    report
        .iterations
        .iter()
        .flat_map(|it| it.citations())
        .find(|c| is_real(c))
        .or_else(|| {
            report
                .iterations
                .iter()
                .flat_map(|it| it.retrieval_plan.iter())
                .flat_map(|entry| entry.top_parent_ids.iter())
                .find(|c| is_real(c))
                .cloned()
        })
}

fn new_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "run_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        &suffix[..4]
    )
}
