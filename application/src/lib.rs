//! Application layer for finqa.
//!
//! Orchestrates the domain logic behind gateway ports: staged retrieval,
//! the per-variant pipeline, and the run controller. Infrastructure crates
//! implement the ports; this crate never talks to the network itself.

pub mod config;
pub mod ports;
pub mod resilience;
pub mod staged_search;
pub mod use_cases;

// Re-export the surface the CLI wires together
pub use config::{ExecutionMode, ExecutionParams};
pub use ports::{
    Completion, RawChunk, RetrievalError, RetrievalGateway, SynthesisError, SynthesisGateway,
};
pub use resilience::{with_retries, CircuitBreaker, ResilienceError, RetryPolicy};
pub use staged_search::StagedSearch;
pub use use_cases::{RunAgentInput, RunAgentUseCase, VariantPipeline, VariantPlan};
