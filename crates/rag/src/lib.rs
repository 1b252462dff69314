//! Retrieval pipeline
//!
//! Query flow: normalized-query cache -> embedding -> language-scoped vector
//! search -> cache fill. Backends: Qdrant for production, an in-memory cosine
//! store seeded from config for development and tests.

pub mod cache;
pub mod embeddings;
pub mod memory_store;
pub mod retriever;
pub mod vector_store;

pub use cache::{CacheStats, RetrievalCache};
pub use embeddings::{HttpEmbedder, HttpEmbedderConfig};
pub use memory_store::InMemorySnippetSearch;
pub use retriever::{ContextRetriever, RetrieverConfig, NO_CONTEXT_SENTINEL};
pub use vector_store::{QdrantSnippetSearch, QdrantSnippetSearchConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Retrieval timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<RagError> for zoid_core::Error {
    fn from(err: RagError) -> Self {
        zoid_core::Error::Retrieval(err.to_string())
    }
}
