//! Retrieval filters and the staged relaxation plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form value used when a year-filtered stage narrows the document type.
pub const DEFAULT_FORM: &str = "10-k";

/// A structured retrieval filter with canonicalized keys.
///
/// Keys are normalized case-insensitively to a small canonical set
/// (`year`, `form`, `doc_type`, `issuer`); unknown keys pass through
/// lowercased. Values are stored as strings; `form` values are lowercased
/// so `10-K` and `10-k` match the same chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalFilter {
    entries: BTreeMap<String, String>,
}

fn canonical_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "year" | "filing_year" => "year".to_string(),
        "form" | "filing_form" | "sec_form" => "form".to_string(),
        "doc_type" | "doctype" | "document_type" => "doc_type".to_string(),
        "issuer" | "company" | "ticker" => "issuer".to_string(),
        _ => lower,
    }
}

impl RetrievalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from raw key/value pairs, normalizing as it goes.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        for (k, v) in pairs {
            filter.insert(k.as_ref(), v.as_ref());
        }
        filter
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        let key = canonical_key(key);
        let value = if key == "form" {
            value.to_lowercase()
        } else {
            value.to_string()
        };
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&canonical_key(key)).map(String::as_str)
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    /// Merge a preferred-year hint without overriding an explicit year.
    pub fn merge_year(&mut self, year: &str) {
        if self.year().is_none() {
            self.insert("year", year);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One filter-relaxation level in the retrieval fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterStage {
    Strict,
    #[serde(rename = "year+form")]
    YearForm,
    YearOnly,
    Unfiltered,
    /// All stages exhausted with zero hits.
    #[serde(rename = "none")]
    Exhausted,
}

impl FilterStage {
    pub fn label(&self) -> &'static str {
        match self {
            FilterStage::Strict => "strict",
            FilterStage::YearForm => "year+form",
            FilterStage::YearOnly => "year-only",
            FilterStage::Unfiltered => "unfiltered",
            FilterStage::Exhausted => "none",
        }
    }
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ordered, progressively relaxed filter stages for one query.
///
/// Stages carrying a year narrow the form to [`DEFAULT_FORM`] (`year+form`)
/// and then drop everything but the year (`year-only`). The final
/// `unfiltered` stage is only emitted when a filter was given at all - a
/// bare query's `strict` stage already means "no constraint".
pub fn relaxation_plan(filter: &RetrievalFilter) -> Vec<(FilterStage, Option<RetrievalFilter>)> {
    if filter.is_empty() {
        return vec![(FilterStage::Strict, None)];
    }

    let mut plan = vec![(FilterStage::Strict, Some(filter.clone()))];

    if let Some(year) = filter.year() {
        let mut with_form = filter.clone();
        let form = with_form.get("form").unwrap_or(DEFAULT_FORM).to_string();
        with_form.insert("form", &form);
        plan.push((FilterStage::YearForm, Some(with_form)));

        let mut year_only = RetrievalFilter::new();
        year_only.insert("year", year);
        plan.push((FilterStage::YearOnly, Some(year_only)));
    }

    plan.push((FilterStage::Unfiltered, None));
    plan
}
