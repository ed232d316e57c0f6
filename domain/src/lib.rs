//! Domain layer for finqa.
//!
//! Core business logic for cited question answering over indexed financial
//! filings: query variants, decomposition and routing, the retrieval
//! relaxation plan, the scoring rubric, and the run/trace entities. This
//! crate has no dependency on infrastructure or async runtime concerns.

pub mod citation;
pub mod core;
pub mod decompose;
pub mod prompt;
pub mod retrieval;
pub mod run;
pub mod scoring;
pub mod util;
pub mod variants;

// Re-export commonly used types
pub use citation::{
    contains_placeholder, ensure_cited, extract_citations, replace_placeholder,
    PLACEHOLDER_CITATION,
};
pub use self::core::{error::AgentError, question::Question};
pub use decompose::{
    decompose, decompose_and_route, route_sub_question, DataSource, RetrievalStrategy,
    SubQuestionRoute,
};
pub use prompt::PromptTemplate;
pub use retrieval::{
    relaxation_plan, FilterStage, RetrievalFilter, SearchHit, StagedSearchOutcome,
};
pub use run::{
    IterationErrorInfo, IterationRecord, LlmCallMeta, RetrievalPlanEntry, RunReport, TokenUsage,
    VariantReport, VariantScore,
};
pub use scoring::{scorer_for, HeuristicRubric, OutputScorer, ScoreBreakdown, DEFAULT_SCORING_MODEL};
pub use variants::generate_variants;
