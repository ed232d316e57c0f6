//! Application-layer configuration.

pub mod execution_params;

pub use execution_params::{ExecutionMode, ExecutionParams};
