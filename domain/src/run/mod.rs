//! Run and trace entities.

pub mod entities;

pub use entities::{
    IterationErrorInfo, IterationRecord, LlmCallMeta, RetrievalPlanEntry, RunReport, TokenUsage,
    VariantReport, VariantScore,
};
