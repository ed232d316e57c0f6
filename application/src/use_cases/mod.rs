//! Use cases: the orchestration entry points of the application layer.

pub mod run_agent;
pub mod variant_pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use run_agent::{RunAgentInput, RunAgentUseCase};
pub use variant_pipeline::{VariantPipeline, VariantPlan};
