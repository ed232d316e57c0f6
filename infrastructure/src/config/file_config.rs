//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application-layer
//! execution parameters.

use finqa_application::config::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("llm.model cannot be empty")]
    EmptyModelName,

    #[error("vector.collection cannot be empty")]
    EmptyCollectionName,

    #[error("agent.top_k cannot be 0")]
    InvalidTopK,

    #[error("agent.self_reflection_iterations cannot be 0")]
    InvalidIterations,

    #[error("timeout_seconds cannot be 0")]
    InvalidTimeout,
}

/// Language-model section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// API key; usually supplied via FINQA_LLM__API_KEY
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Vector-search section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVectorConfig {
    /// Chroma-compatible API base URL
    pub base_url: String,
    pub collection: String,
    pub timeout_seconds: u64,
}

impl Default for FileVectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            collection: "filings".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Agent-behavior section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub top_k: usize,
    pub self_reflection_iterations: usize,
    pub max_variants: usize,
    pub enable_query_variants: bool,
    pub enable_output_scoring: bool,
    pub scoring_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            top_k: params.top_k,
            self_reflection_iterations: params.self_reflection_iterations,
            max_variants: params.max_variants,
            enable_query_variants: params.enable_query_variants,
            enable_output_scoring: params.enable_output_scoring,
            scoring_model: finqa_domain::scoring::DEFAULT_SCORING_MODEL.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

impl FileAgentConfig {
    /// Convert the file section into run parameters, keeping the built-in
    /// resilience defaults.
    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams {
            top_k: self.top_k,
            self_reflection_iterations: self.self_reflection_iterations,
            max_variants: self.max_variants,
            enable_query_variants: self.enable_query_variants,
            enable_output_scoring: self.enable_output_scoring,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..ExecutionParams::default()
        }
    }
}

/// Root of the TOML config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub llm: FileLlmConfig,
    pub vector: FileVectorConfig,
    pub agent: FileAgentConfig,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.vector.collection.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCollectionName);
        }
        if self.agent.top_k == 0 {
            return Err(ConfigValidationError::InvalidTopK);
        }
        if self.agent.self_reflection_iterations == 0 {
            return Err(ConfigValidationError::InvalidIterations);
        }
        if self.llm.timeout_seconds == 0 || self.vector.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_seconds)
    }

    pub fn vector_timeout(&self) -> Duration {
        Duration::from_secs(self.vector.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = FileConfig::default();
        config.agent.top_k = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTopK)
        ));
    }

    #[test]
    fn agent_section_maps_to_execution_params() {
        let mut config = FileAgentConfig::default();
        config.top_k = 10;
        config.enable_query_variants = false;
        let params = config.execution_params();
        assert_eq!(params.top_k, 10);
        assert!(!params.enable_query_variants);
        // Resilience settings are not file-configurable and keep defaults.
        assert_eq!(params.retry_max_attempts, 3);
    }

    #[test]
    fn toml_roundtrip_keeps_sections() {
        let raw = r#"
            [llm]
            model = "gpt-4.1"

            [vector]
            collection = "sec-filings"

            [agent]
            top_k = 8
        "#;
        let config: FileConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.vector.collection, "sec-filings");
        assert_eq!(config.agent.top_k, 8);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    }
}
