//! In-memory gateway stubs shared by the use-case tests.

use crate::config::ExecutionParams;
use crate::ports::retrieval_gateway::{RawChunk, RetrievalError, RetrievalGateway};
use crate::ports::synthesis_gateway::{Completion, SynthesisError, SynthesisGateway};
use crate::resilience::CircuitBreaker;
use crate::staged_search::StagedSearch;
use crate::use_cases::variant_pipeline::{VariantPipeline, VariantPlan};
use async_trait::async_trait;
use finqa_domain::retrieval::RetrievalFilter;
use finqa_domain::run::TokenUsage;
use finqa_domain::scoring::{scorer_for, DEFAULT_SCORING_MODEL};
use serde_json::Map;
use std::sync::Arc;

/// Backend that never has anything to offer.
pub struct EmptyRetrieval;

#[async_trait]
impl RetrievalGateway for EmptyRetrieval {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _filter: Option<&RetrievalFilter>,
    ) -> Result<Vec<RawChunk>, RetrievalError> {
        Ok(Vec::new())
    }
}

/// Backend that panics on first use, simulating a crashed variant task.
pub struct PanickingRetrieval;

#[async_trait]
impl RetrievalGateway for PanickingRetrieval {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _filter: Option<&RetrievalFilter>,
    ) -> Result<Vec<RawChunk>, RetrievalError> {
        panic!("retrieval backend blew up");
    }
}

/// Backend answering every query with the same single chunk.
pub struct SingleHitRetrieval {
    id: String,
    text: String,
}

impl SingleHitRetrieval {
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    /// One chunk carrying both years of the revenue comparison.
    pub fn tesla() -> Self {
        Self::new(
            "tesla-10k-2019::chunk::0001",
            "Total revenue was $24,578 million in 2019 compared to $21,461 million in 2018, \
             an increase driven primarily by Model 3 deliveries.",
        )
    }
}

#[async_trait]
impl RetrievalGateway for SingleHitRetrieval {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _filter: Option<&RetrievalFilter>,
    ) -> Result<Vec<RawChunk>, RetrievalError> {
        Ok(vec![RawChunk {
            id: self.id.clone(),
            text: self.text.clone(),
            metadata: Map::new(),
        }])
    }
}

/// Synthesis backend returning a fixed completion.
pub struct ScriptedSynthesis {
    text: String,
}

impl ScriptedSynthesis {
    pub fn always(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl SynthesisGateway for ScriptedSynthesis {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<Completion, SynthesisError> {
        Ok(Completion {
            text: self.text.clone(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            usage: TokenUsage::new(120, 40),
        })
    }
}

pub fn pipeline_with(
    retrieval: Arc<dyn RetrievalGateway>,
    synthesis: Arc<dyn SynthesisGateway>,
    params: ExecutionParams,
) -> VariantPipeline {
    let retrieval_breaker = Arc::new(CircuitBreaker::new(
        params.retrieval_failure_threshold,
        params.retrieval_recovery_time,
    ));
    let synthesis_breaker = Arc::new(CircuitBreaker::new(
        params.synthesis_failure_threshold,
        params.synthesis_recovery_time,
    ));
    let staged = StagedSearch::new(retrieval, retrieval_breaker, params.retry_policy());
    VariantPipeline::new(
        staged,
        synthesis,
        synthesis_breaker,
        scorer_for(DEFAULT_SCORING_MODEL),
        params,
    )
}

pub fn plan_for(query: &str) -> VariantPlan {
    VariantPlan {
        index: 1,
        query: query.to_string(),
        sub_questions: Vec::new(),
        routes: Vec::new(),
        filter: RetrievalFilter::default(),
    }
}
