//! In-memory snippet search
//!
//! Cosine similarity over knowledge chunks embedded at startup. Used as a
//! development fallback when no Qdrant endpoint is configured, and in tests.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

use zoid_config::KnowledgeChunk;
use zoid_core::{Language, Result, Snippet, SnippetSearch, TextEmbedder};

struct IndexedChunk {
    content: String,
    language: Language,
    vector: Vec<f32>,
}

/// Snippet search over an in-memory embedded knowledge base
pub struct InMemorySnippetSearch {
    chunks: Vec<IndexedChunk>,
}

impl InMemorySnippetSearch {
    /// Embed all seed chunks concurrently and build the index
    pub async fn build(
        embedder: Arc<dyn TextEmbedder>,
        chunks: &[KnowledgeChunk],
    ) -> Result<Self> {
        let vectors = try_join_all(chunks.iter().map(|c| embedder.embed(&c.content))).await?;

        let indexed = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk {
                content: chunk.content.clone(),
                language: Language::parse_or_default(&chunk.language),
                vector,
            })
            .collect::<Vec<_>>();

        tracing::info!(chunks = indexed.len(), "In-memory knowledge base indexed");
        Ok(Self { chunks: indexed })
    }

    /// Build from pre-embedded chunks (tests)
    pub fn from_vectors(chunks: Vec<(String, Language, Vec<f32>)>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .map(|(content, language, vector)| IndexedChunk {
                    content,
                    language,
                    vector,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[async_trait]
impl SnippetSearch for InMemorySnippetSearch {
    async fn search(&self, vector: &[f32], k: usize, language: Language) -> Result<Vec<Snippet>> {
        let mut scored: Vec<Snippet> = self
            .chunks
            .iter()
            .filter(|c| c.language == language)
            .map(|c| Snippet {
                content: c.content.clone(),
                score: cosine_similarity(vector, &c.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}
