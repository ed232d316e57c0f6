//! Agent error taxonomy

use crate::retrieval::RetrievalFilter;
use serde_json::{json, Value};
use thiserror::Error;

/// Terminal failures raised by a run.
///
/// These are logical conditions, not transient faults: the caller is expected
/// to adjust filters or credentials and retry the whole run. HTTP-style
/// status codes are exposed via [`AgentError::http_status`] but only the
/// presentation boundary should map them onto a transport.
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("no candidates produced; filters may be too strict")]
    RetrievalEmpty {
        top_k: usize,
        filters: RetrievalFilter,
    },

    #[error("model returned placeholder citations; no real ids found")]
    PlaceholderCitations { filters: RetrievalFilter },

    #[error("no citations present; increase top_k or relax filters")]
    InsufficientEvidence {
        top_k: usize,
        filters: RetrievalFilter,
    },

    #[error("synthesis authentication failed: {0}")]
    LlmAuth(String),

    #[error("synthesis rate limited: {0}")]
    LlmRateLimit(String),

    #[error("synthesis service unavailable: {0}")]
    LlmUnavailable(String),

    #[error("retrieval service unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("circuit open for {call}; attempt rejected")]
    CircuitOpen { call: &'static str },

    #[error("internal failure: {0}")]
    Internal(String),
}

impl AgentError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::RetrievalEmpty { .. } => "RETRIEVAL_EMPTY",
            AgentError::PlaceholderCitations { .. } => "PLACEHOLDER_CITATIONS",
            AgentError::InsufficientEvidence { .. } => "INSUFFICIENT_EVIDENCE",
            AgentError::LlmAuth(_) => "LLM_AUTH",
            AgentError::LlmRateLimit(_) => "LLM_RATE_LIMIT",
            AgentError::LlmUnavailable(_) => "LLM_UNAVAILABLE",
            AgentError::RetrievalUnavailable(_) => "RETRIEVAL_UNAVAILABLE",
            AgentError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            AgentError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-style status class, consumed only at the presentation boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            AgentError::RetrievalEmpty { .. } => 404,
            AgentError::PlaceholderCitations { .. } => 422,
            AgentError::InsufficientEvidence { .. } => 422,
            AgentError::LlmAuth(_) => 401,
            AgentError::LlmRateLimit(_) => 429,
            AgentError::LlmUnavailable(_) => 503,
            AgentError::RetrievalUnavailable(_) => 503,
            AgentError::CircuitOpen { .. } => 503,
            AgentError::Internal(_) => 500,
        }
    }

    /// Structured details payload for the caller.
    pub fn details(&self) -> Value {
        match self {
            AgentError::RetrievalEmpty { top_k, filters } => {
                json!({ "top_k": top_k, "filters": filters })
            }
            AgentError::PlaceholderCitations { filters } => json!({ "filters": filters }),
            AgentError::InsufficientEvidence { top_k, filters } => {
                json!({ "top_k": top_k, "filters": filters })
            }
            AgentError::CircuitOpen { call } => json!({ "call": call }),
            _ => json!({}),
        }
    }
}
