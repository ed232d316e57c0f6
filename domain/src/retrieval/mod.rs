//! Retrieval model: filters, relaxation stages, and hit normalization.

pub mod filter;
pub mod hit;

pub use filter::{relaxation_plan, FilterStage, RetrievalFilter, DEFAULT_FORM};
pub use hit::{derive_parent_id, SearchHit, StagedSearchOutcome, CHUNK_SEPARATOR};
