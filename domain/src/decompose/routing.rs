//! Sub-question routing.
//!
//! Each retained sub-question is annotated with a target data source and a
//! retrieval strategy. Routing is metadata only: both sources currently map
//! to the same vector-search mechanism, but the annotation survives into the
//! trace so a future router can branch on it.

use serde::{Deserialize, Serialize};

const RISK_KEYWORDS: &[&str] = &["risk", "uncertaint", "litigation", "item 1a", "contingenc"];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "revenue", "income", "margin", "cash", "expense", "profit", "earnings", "segment", "dividend",
];

/// Target source for a routed sub-question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    FinancialStatements,
    RiskFactors,
    General,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataSource::FinancialStatements => "financial_statements",
            DataSource::RiskFactors => "risk_factors",
            DataSource::General => "general",
        };
        write!(f, "{name}")
    }
}

/// Closed set of retrieval mechanisms a route can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    VectorSearch,
}

/// Routing decision for one sub-question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionRoute {
    pub sub_question: String,
    pub source: DataSource,
    pub strategy: RetrievalStrategy,
}

/// Assign a route by keyword match against the filing vocabulary.
pub fn route_sub_question(sub_question: &str) -> SubQuestionRoute {
    let lower = sub_question.to_lowercase();
    let source = if RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        DataSource::RiskFactors
    } else if FINANCIAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        DataSource::FinancialStatements
    } else {
        DataSource::General
    };
    SubQuestionRoute {
        sub_question: sub_question.to_string(),
        source,
        strategy: RetrievalStrategy::VectorSearch,
    }
}
