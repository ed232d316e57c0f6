//! Execution parameters - run loop control.
//!
//! Groups the static knobs that shape a run: budgets for variants and
//! self-reflection iterations, retrieval depth, accumulation caps, and the
//! resilience settings for the two external call sites.

use crate::resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How variant pipelines are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Fan-out/fan-in with no ordering guarantee between variants.
    #[default]
    Parallel,
    /// Strictly one variant after another.
    Sequential,
}

/// Static run control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Hits requested from the retrieval collaborator per stage call.
    pub top_k: usize,
    /// Self-reflection iteration budget per variant.
    pub self_reflection_iterations: usize,
    /// Maximum generated query variants (the original is always included).
    pub max_variants: usize,
    pub enable_query_variants: bool,
    pub enable_output_scoring: bool,
    /// New distinct parents pulled from the top hits per retrieval attempt.
    pub parents_per_attempt: usize,
    /// Cumulative distinct context snippets kept per variant.
    pub max_context_snippets: usize,
    /// Synthesis sampling temperature.
    pub temperature: f32,
    /// Synthesis completion token cap.
    pub max_tokens: u32,
    /// Consecutive failures before the retrieval breaker opens.
    pub retrieval_failure_threshold: u32,
    /// Retrieval breaker cooldown.
    pub retrieval_recovery_time: Duration,
    /// Consecutive failures before the synthesis breaker opens.
    pub synthesis_failure_threshold: u32,
    /// Synthesis breaker cooldown.
    pub synthesis_recovery_time: Duration,
    /// Attempt budget per external call.
    pub retry_max_attempts: u32,
    /// Base backoff for the exponential retry schedule.
    pub retry_base_backoff: Duration,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            self_reflection_iterations: 3,
            max_variants: 3,
            enable_query_variants: true,
            enable_output_scoring: true,
            parents_per_attempt: 3,
            max_context_snippets: 8,
            temperature: 0.3,
            max_tokens: 256,
            retrieval_failure_threshold: 3,
            retrieval_recovery_time: Duration::from_secs(30),
            synthesis_failure_threshold: 3,
            synthesis_recovery_time: Duration::from_secs(20),
            retry_max_attempts: 3,
            retry_base_backoff: Duration::from_millis(400),
        }
    }
}

impl ExecutionParams {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_base_backoff)
    }

    // ==================== Builder methods ====================

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_self_reflection_iterations(mut self, iterations: usize) -> Self {
        self.self_reflection_iterations = iterations;
        self
    }

    pub fn with_max_variants(mut self, max: usize) -> Self {
        self.max_variants = max;
        self
    }

    pub fn with_query_variants(mut self, enabled: bool) -> Self {
        self.enable_query_variants = enabled;
        self
    }

    pub fn with_output_scoring(mut self, enabled: bool) -> Self {
        self.enable_output_scoring = enabled;
        self
    }
}
