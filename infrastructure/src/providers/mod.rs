//! Language-model provider adapters

mod openai;

pub use openai::OpenAiSynthesisGateway;
