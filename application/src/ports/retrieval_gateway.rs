//! Retrieval gateway port.
//!
//! Defines how the application layer talks to the external vector-search
//! collaborator. Adapters live in the infrastructure layer; tests supply
//! in-memory stubs.

use async_trait::async_trait;
use finqa_domain::retrieval::RetrievalFilter;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors a retrieval backend can raise.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl RetrievalError {
    /// Transient faults are retried by the resilience wrapper.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RetrievalError::Connection(_) | RetrievalError::RateLimited(_)
        )
    }
}

/// One raw chunk as returned by the backend, before hit normalization.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Gateway to the vector-search collaborator.
///
/// An absent filter means "no constraint"; implementations must tolerate it.
#[async_trait]
pub trait RetrievalGateway: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&RetrievalFilter>,
    ) -> Result<Vec<RawChunk>, RetrievalError>;
}
