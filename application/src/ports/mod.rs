//! Ports: interfaces the application layer exposes to infrastructure.

pub mod retrieval_gateway;
pub mod synthesis_gateway;

pub use retrieval_gateway::{RawChunk, RetrievalError, RetrievalGateway};
pub use synthesis_gateway::{Completion, SynthesisError, SynthesisGateway};
