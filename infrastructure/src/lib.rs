//! Infrastructure layer for finqa
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod providers;
pub mod vector;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileConfig, FileLlmConfig,
    FileVectorConfig,
};
pub use providers::OpenAiSynthesisGateway;
pub use vector::ChromaRetrievalGateway;
