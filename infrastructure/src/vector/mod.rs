//! Vector-search adapters

mod chroma;

pub use chroma::ChromaRetrievalGateway;
