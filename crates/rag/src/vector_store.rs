//! Qdrant-backed snippet search
//!
//! Dense similarity search scoped by a `language` payload filter. The index
//! itself (ingestion, chunking) is maintained externally; this core only
//! queries it.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{value::Kind, Condition, Filter, SearchPointsBuilder},
    Qdrant,
};

use zoid_core::{Language, Result, Snippet, SnippetSearch};

use crate::RagError;

/// Qdrant search configuration
#[derive(Debug, Clone)]
pub struct QdrantSnippetSearchConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for QdrantSnippetSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:6334".to_string(),
            collection: "zoid_knowledge".to_string(),
            api_key: None,
        }
    }
}

/// Snippet search over a Qdrant collection
pub struct QdrantSnippetSearch {
    client: Qdrant,
    config: QdrantSnippetSearchConfig,
}

impl QdrantSnippetSearch {
    /// Connect to Qdrant
    pub async fn new(config: QdrantSnippetSearchConfig) -> std::result::Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Configuration(format!("Qdrant connection failed: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Verify the collection exists; used as a startup health check
    pub async fn health_check(&self) -> std::result::Result<(), RagError> {
        self.client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::Search(format!("Qdrant health check failed: {}", e)))?
            .then_some(())
            .ok_or_else(|| {
                RagError::Configuration(format!(
                    "Qdrant collection '{}' does not exist",
                    self.config.collection
                ))
            })
    }
}

#[async_trait]
impl SnippetSearch for QdrantSnippetSearch {
    async fn search(&self, vector: &[f32], k: usize, language: Language) -> Result<Vec<Snippet>> {
        let filter = Filter::must([Condition::matches(
            "language",
            language.code().to_string(),
        )]);

        let request =
            SearchPointsBuilder::new(&self.config.collection, vector.to_vec(), k as u64)
                .filter(filter)
                .with_payload(true);

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| RagError::Search(format!("Qdrant search failed: {}", e)))
            .map_err(zoid_core::Error::from)?;

        let snippets = response
            .result
            .into_iter()
            .filter_map(|point| {
                let content = point.payload.get("content").and_then(|v| match &v.kind {
                    Some(Kind::StringValue(s)) => Some(s.clone()),
                    _ => None,
                })?;
                Some(Snippet {
                    content,
                    score: point.score,
                })
            })
            .collect();

        Ok(snippets)
    }
}
