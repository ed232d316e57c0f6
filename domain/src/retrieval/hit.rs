//! Search hits and staged-search outcomes.

use super::filter::FilterStage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between a parent document id and its chunk suffix.
pub const CHUNK_SEPARATOR: &str = "::chunk::";

/// One retrievable chunk returned by the vector-search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    /// Logical document-level id this chunk belongs to.
    pub parent_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchHit {
    /// Normalize a raw hit, deriving the parent id from metadata or, when
    /// absent, by splitting the chunk id at [`CHUNK_SEPARATOR`].
    pub fn from_raw(id: String, text: String, metadata: Map<String, Value>) -> Self {
        let parent_id = derive_parent_id(&id, &metadata);
        Self {
            id,
            text,
            parent_id,
            metadata,
        }
    }
}

/// Parent id from `metadata.parent_id`, else the chunk-id prefix.
pub fn derive_parent_id(id: &str, metadata: &Map<String, Value>) -> String {
    if let Some(pid) = metadata.get("parent_id").and_then(Value::as_str) {
        if !pid.is_empty() {
            return pid.to_string();
        }
    }
    match id.split_once(CHUNK_SEPARATOR) {
        Some((parent, _)) => parent.to_string(),
        None => id.to_string(),
    }
}

/// Result of driving the relaxation plan for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedSearchOutcome {
    pub hits: Vec<SearchHit>,
    /// Stage that produced the hits, or [`FilterStage::Exhausted`].
    pub stage: FilterStage,
    pub latency_ms: u64,
}

impl StagedSearchOutcome {
    pub fn exhausted(latency_ms: u64) -> Self {
        Self {
            hits: Vec::new(),
            stage: FilterStage::Exhausted,
            latency_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
