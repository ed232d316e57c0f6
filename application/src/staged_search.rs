//! Staged retrieval with progressive filter relaxation.
//!
//! Walks the domain relaxation plan against the retrieval gateway and stops
//! at the first stage that yields hits. Every stage call runs through the
//! resilience wrapper with the run-wide retrieval breaker.

use crate::ports::retrieval_gateway::{RetrievalError, RetrievalGateway};
use crate::resilience::{with_retries, CircuitBreaker, ResilienceError, RetryPolicy};
use finqa_domain::retrieval::{relaxation_plan, RetrievalFilter, SearchHit, StagedSearchOutcome};
use finqa_domain::AgentError;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Executes the staged, progressively relaxed vector search.
pub struct StagedSearch {
    gateway: Arc<dyn RetrievalGateway>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
}

impl StagedSearch {
    pub fn new(
        gateway: Arc<dyn RetrievalGateway>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            breaker,
            policy,
        }
    }

    /// Return the first non-empty hit set across the relaxation stages, or
    /// an outcome tagged `none` when every stage came back empty.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: &RetrievalFilter,
    ) -> Result<StagedSearchOutcome, AgentError> {
        let started = Instant::now();

        for (stage, stage_filter) in relaxation_plan(filter) {
            debug!(%stage, query, "vector search stage");
            let chunks = with_retries(
                || self.gateway.search(query, top_k, stage_filter.as_ref()),
                RetrievalError::is_retryable,
                &self.breaker,
                &self.policy,
            )
            .await
            .map_err(|e| match e {
                ResilienceError::CircuitOpen => AgentError::CircuitOpen { call: "retrieval" },
                ResilienceError::Inner(err) => AgentError::RetrievalUnavailable(err.to_string()),
            })?;

            let hits: Vec<SearchHit> = chunks
                .into_iter()
                .map(|c| SearchHit::from_raw(c.id, c.text, c.metadata))
                .collect();
            debug!(%stage, hits = hits.len(), "vector search stage done");

            if !hits.is_empty() {
                return Ok(StagedSearchOutcome {
                    hits,
                    stage,
                    latency_ms: started.elapsed().as_millis() as u64,
                });
            }
        }

        Ok(StagedSearchOutcome::exhausted(
            started.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::retrieval_gateway::RawChunk;
    use async_trait::async_trait;
    use finqa_domain::retrieval::FilterStage;
    use serde_json::Map;
    use std::sync::Mutex;

    /// Stub that records the filter of each stage call and answers only for
    /// the configured predicate.
    struct StageStub {
        answer_when: fn(Option<&RetrievalFilter>) -> bool,
        calls: Mutex<Vec<Option<RetrievalFilter>>>,
    }

    impl StageStub {
        fn new(answer_when: fn(Option<&RetrievalFilter>) -> bool) -> Self {
            Self {
                answer_when,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RetrievalGateway for StageStub {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            filter: Option<&RetrievalFilter>,
        ) -> Result<Vec<RawChunk>, RetrievalError> {
            self.calls.lock().unwrap().push(filter.cloned());
            if (self.answer_when)(filter) {
                Ok(vec![RawChunk {
                    id: "tesla-10k-2019::chunk::0001".into(),
                    text: "Total revenue was $24.6B in 2019.".into(),
                    metadata: Map::new(),
                }])
            } else {
                Ok(vec![])
            }
        }
    }

    fn search_for(stub: Arc<StageStub>) -> StagedSearch {
        StagedSearch::new(
            stub,
            Arc::new(CircuitBreaker::new(3, std::time::Duration::from_secs(30))),
            RetryPolicy::default(),
        )
    }

    #[tokio::test]
    async fn strict_hit_stops_relaxation() {
        let stub = Arc::new(StageStub::new(|_| true));
        let search = search_for(stub.clone());
        let filter = RetrievalFilter::from_pairs([("year", "2019"), ("issuer", "tesla")]);

        let outcome = search.search("revenue", 5, &filter).await.unwrap();
        assert_eq!(outcome.stage, FilterStage::Strict);
        assert_eq!(stub.call_count(), 1);
        assert_eq!(outcome.hits[0].parent_id, "tesla-10k-2019");
    }

    #[tokio::test]
    async fn relaxes_to_unfiltered_before_giving_up() {
        // Only the unconstrained stage answers.
        let stub = Arc::new(StageStub::new(|f| f.is_none()));
        let search = search_for(stub.clone());
        let filter = RetrievalFilter::from_pairs([("year", "2019")]);

        let outcome = search.search("revenue", 5, &filter).await.unwrap();
        assert_eq!(outcome.stage, FilterStage::Unfiltered);
        // strict, year+form, year-only, unfiltered
        assert_eq!(stub.call_count(), 4);
    }

    #[tokio::test]
    async fn exhausted_stages_return_none_outcome() {
        let stub = Arc::new(StageStub::new(|_| false));
        let search = search_for(stub.clone());
        let filter = RetrievalFilter::from_pairs([("year", "2019")]);

        let outcome = search.search("revenue", 5, &filter).await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.stage, FilterStage::Exhausted);
        assert_eq!(stub.call_count(), 4);
    }

    struct FailingStub;

    #[async_trait]
    impl RetrievalGateway for FailingStub {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _filter: Option<&RetrievalFilter>,
        ) -> Result<Vec<RawChunk>, RetrievalError> {
            Err(RetrievalError::Backend("index corrupted".into()))
        }
    }

    #[tokio::test]
    async fn backend_failure_maps_to_retrieval_unavailable() {
        let search = StagedSearch::new(
            Arc::new(FailingStub),
            Arc::new(CircuitBreaker::new(5, std::time::Duration::from_secs(30))),
            RetryPolicy::new(1, std::time::Duration::from_millis(1)),
        );
        let err = search
            .search("revenue", 5, &RetrievalFilter::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RETRIEVAL_UNAVAILABLE");
    }
}
