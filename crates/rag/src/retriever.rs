//! Context retriever
//!
//! Cache-first retrieval: on a miss, embed the query, run language-scoped
//! similarity search, cache the result. Callers always receive at least one
//! snippet so there is something to embed into the prompt.

use std::sync::Arc;
use std::time::Duration;

use zoid_core::{Error, Language, Result, SnippetSearch, TextEmbedder};

use crate::cache::RetrievalCache;
use crate::RagError;

/// Returned as the sole snippet when the search finds nothing
pub const NO_CONTEXT_SENTINEL: &str =
    "No relevant information was found in the knowledge base for this question.";

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Number of snippets to return
    pub top_k: usize,
    /// Timeout applied to the embedding call and to the search call
    pub timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Cache-first context retriever
pub struct ContextRetriever {
    embedder: Arc<dyn TextEmbedder>,
    search: Arc<dyn SnippetSearch>,
    cache: Arc<RetrievalCache>,
    config: RetrieverConfig,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        search: Arc<dyn SnippetSearch>,
        cache: Arc<RetrievalCache>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            embedder,
            search,
            cache,
            config,
        }
    }

    /// Retrieve ranked context snippets for a query.
    ///
    /// Failures (embedding, search, timeout) propagate as `Error::Retrieval`;
    /// no partial or stale result is fabricated.
    pub async fn retrieve(&self, query: &str, language: Language) -> Result<Vec<String>> {
        if let Some(snippets) = self.cache.get(language, query) {
            tracing::debug!(language = %language, "Retrieval cache hit");
            return Ok(snippets);
        }

        let timeout_secs = self.config.timeout.as_secs();

        let vector = tokio::time::timeout(self.config.timeout, self.embedder.embed(query))
            .await
            .map_err(|_| Error::from(RagError::Timeout(timeout_secs)))??;

        let results = tokio::time::timeout(
            self.config.timeout,
            self.search.search(&vector, self.config.top_k, language),
        )
        .await
        .map_err(|_| Error::from(RagError::Timeout(timeout_secs)))??;

        let snippets: Vec<String> = if results.is_empty() {
            vec![NO_CONTEXT_SENTINEL.to_string()]
        } else {
            results.into_iter().map(|s| s.content).collect()
        };

        self.cache.put(language, query, snippets.clone());
        Ok(snippets)
    }

    pub fn cache(&self) -> &RetrievalCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zoid_core::Snippet;

    /// Embedder that counts invocations
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Retrieval("embedding backend down".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }
    }

    struct FixedSearch {
        snippets: Vec<Snippet>,
    }

    #[async_trait]
    impl SnippetSearch for FixedSearch {
        async fn search(
            &self,
            _vector: &[f32],
            k: usize,
            _language: Language,
        ) -> Result<Vec<Snippet>> {
            Ok(self.snippets.iter().take(k).cloned().collect())
        }
    }

    fn retriever(
        embedder: Arc<CountingEmbedder>,
        snippets: Vec<Snippet>,
    ) -> ContextRetriever {
        ContextRetriever::new(
            embedder,
            Arc::new(FixedSearch { snippets }),
            Arc::new(RetrievalCache::new(10, Duration::from_secs(3600))),
            RetrieverConfig::default(),
        )
    }

    #[tokio::test]
    async fn repeated_query_embeds_once_within_ttl() {
        let embedder = Arc::new(CountingEmbedder::new());
        let retriever = retriever(
            embedder.clone(),
            vec![Snippet {
                content: "reset in settings".to_string(),
                score: 0.9,
            }],
        );

        let first = retriever
            .retrieve("How do I reset my password?", Language::EnUs)
            .await
            .unwrap();
        // Same normalized text, different case/punctuation
        let second = retriever
            .retrieve("how do i reset my password", Language::EnUs)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(embedder.count(), 1);
    }

    #[tokio::test]
    async fn empty_results_yield_sentinel_not_empty_list() {
        let embedder = Arc::new(CountingEmbedder::new());
        let retriever = retriever(embedder, Vec::new());

        let snippets = retriever
            .retrieve("unknown topic", Language::EnUs)
            .await
            .unwrap();
        assert_eq!(snippets, vec![NO_CONTEXT_SENTINEL.to_string()]);
    }

    #[tokio::test]
    async fn embedding_failure_propagates_as_retrieval_error() {
        let embedder = Arc::new(CountingEmbedder::failing());
        let retriever = retriever(embedder, Vec::new());

        let err = retriever
            .retrieve("anything", Language::EnUs)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }
}
