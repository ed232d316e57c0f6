//! Synthesis gateway port.
//!
//! Defines how the application layer invokes the language-model synthesis
//! collaborator. Adapters live in the infrastructure layer.

use async_trait::async_trait;
use finqa_domain::run::TokenUsage;
use thiserror::Error;

/// Errors a synthesis backend can raise.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Never retried; surfaces immediately.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("api error: {0}")]
    Api(String),
}

impl SynthesisError {
    /// Rate limiting and connectivity faults are transient and retryable;
    /// authentication failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthesisError::RateLimited(_) | SynthesisError::Connection(_)
        )
    }
}

/// A completed synthesis call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Gateway to the language-model synthesis collaborator.
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, SynthesisError>;
}
