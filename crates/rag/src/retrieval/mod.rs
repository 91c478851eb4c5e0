//! Multi-modal retrieval
//!
//! Two retrieval modes over the same collection:
//! - Semantic: dense embedding similarity
//! - Hybrid: dense + sparse prefetches fused with RRF
//!
//! Scores are mode-specific (cosine similarity vs. fused rank score) and
//! deliberately not comparable across modes.

mod fusion;

pub use fusion::{FusedPoint, RrfFusion};

use crate::embeddings::{DenseEmbedder, SparseEncoder};
use crate::store::{ScoredPoint, VectorStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use wayfarer_common::config::SearchConfig;
use wayfarer_common::errors::{AppError, Result};
use wayfarer_common::metrics::METRICS_PREFIX;

/// Retrieval mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Dense embedding similarity
    #[default]
    Semantic,
    /// RRF fusion of dense and sparse retrieval
    Hybrid,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Semantic => f.write_str("semantic"),
            SearchMode::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// A retrieved chunk, ready for prompt assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk text
    pub content: String,

    /// Free-text location tag
    pub location: String,

    /// Source document reference
    pub doc_id: String,

    /// Mode-specific relevance score
    pub score: f32,
}

impl From<ScoredPoint> for SearchResult {
    fn from(point: ScoredPoint) -> Self {
        Self {
            content: point.payload.content,
            location: point.payload.location,
            doc_id: point.payload.doc_id,
            score: point.score,
        }
    }
}

/// Retriever over a vector store
///
/// Store or embedding failures degrade to an empty result list so the
/// pipeline can continue with an ungrounded prompt; only invalid input is
/// rejected.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn DenseEmbedder>,
    sparse: SparseEncoder,
    fusion: RrfFusion,
    prefetch_factor: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn DenseEmbedder>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            sparse: SparseEncoder::new(),
            fusion: RrfFusion::new(config.rrf_k),
            prefetch_factor: config.prefetch_factor,
        }
    }

    /// Retrieve the `limit` most relevant chunks for a query
    pub async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Err(AppError::Validation {
                message: "limit must be positive".to_string(),
                field: Some("limit".to_string()),
            });
        }

        let start = Instant::now();
        let results = match mode {
            SearchMode::Semantic => self.semantic(query, limit).await,
            SearchMode::Hybrid => self.hybrid(query, limit).await,
        };

        metrics::counter!(
            format!("{}_search_queries_total", METRICS_PREFIX),
            "mode" => mode.to_string()
        )
        .increment(1);
        metrics::histogram!(
            format!("{}_search_duration_seconds", METRICS_PREFIX),
            "mode" => mode.to_string()
        )
        .record(start.elapsed().as_secs_f64());
        metrics::gauge!(format!("{}_search_results_count", METRICS_PREFIX))
            .set(results.len() as f64);

        Ok(results)
    }

    async fn semantic(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let points = match self.dense_leg(query, limit).await {
            Ok(points) => points,
            Err(e) => {
                self.degrade("semantic", &e);
                Vec::new()
            }
        };
        points.into_iter().map(SearchResult::from).collect()
    }

    async fn hybrid(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let prefetch = self.prefetch_factor * limit;

        // The two prefetches are independent; fusion is commutative over them
        let (dense, sparse) = tokio::join!(
            self.dense_leg(query, prefetch),
            self.sparse_leg(query, prefetch)
        );

        let dense = dense.unwrap_or_else(|e| {
            self.degrade("hybrid-dense", &e);
            Vec::new()
        });
        let sparse = sparse.unwrap_or_else(|e| {
            self.degrade("hybrid-sparse", &e);
            Vec::new()
        });

        self.fusion
            .fuse(dense, sparse, limit)
            .into_iter()
            .map(|fused| SearchResult::from(fused.point))
            .collect()
    }

    async fn dense_leg(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        let vector = self.embedder.embed(query).await?;
        self.store.query_dense(&vector, limit).await
    }

    async fn sparse_leg(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        let encoded = self.sparse.encode(query);
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        self.store.query_sparse(&encoded, limit).await
    }

    fn degrade(&self, leg: &str, error: &AppError) {
        tracing::warn!(leg, error = %error, "Retrieval degraded to empty results");
        metrics::counter!(
            format!("{}_search_degraded_total", METRICS_PREFIX),
            "leg" => leg.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{DenseEmbedder, HashEmbedder};
    use crate::store::{ChunkPayload, MemoryChunk, MemoryStore, SparseVector};

    struct UnreachableStore;

    #[async_trait::async_trait]
    impl VectorStore for UnreachableStore {
        async fn query_dense(&self, _: &[f32], _: usize) -> Result<Vec<ScoredPoint>> {
            Err(AppError::Store {
                message: "connection refused".to_string(),
            })
        }

        async fn query_sparse(&self, _: &SparseVector, _: usize) -> Result<Vec<ScoredPoint>> {
            Err(AppError::Store {
                message: "connection refused".to_string(),
            })
        }

        async fn ping(&self) -> Result<()> {
            Err(AppError::Store {
                message: "connection refused".to_string(),
            })
        }
    }

    async fn seeded_store(texts: &[(&str, &str)]) -> MemoryStore {
        let embedder = HashEmbedder::new(16);
        let encoder = SparseEncoder::new();
        let mut store = MemoryStore::new();
        for (i, (location, content)) in texts.iter().enumerate() {
            store.insert(MemoryChunk {
                id: format!("chunk-{}", i),
                payload: ChunkPayload {
                    content: content.to_string(),
                    location: location.to_string(),
                    doc_id: format!("doc-{}", i),
                },
                dense: embedder.embed(content).await.unwrap(),
                sparse: encoder.encode(content),
            });
        }
        store
    }

    fn retriever(store: Arc<dyn VectorStore>) -> Retriever {
        Retriever::new(store, Arc::new(HashEmbedder::new(16)), &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let store = seeded_store(&[("Hampi", "Hampi is famous for its temples")]).await;
        let retriever = retriever(Arc::new(store));

        let err = retriever
            .search("temples", SearchMode::Semantic, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_empty() {
        let retriever = retriever(Arc::new(UnreachableStore));

        let results = retriever
            .search("temples of Hampi", SearchMode::Semantic, 5)
            .await
            .unwrap();
        assert!(results.is_empty());

        let results = retriever
            .search("temples of Hampi", SearchMode::Hybrid, 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_semantic_finds_matching_chunk() {
        let store = seeded_store(&[
            ("Hampi", "Hampi is famous for its ancient temples and ruins"),
            ("Goa", "Goa is known for beaches and nightlife"),
        ])
        .await;
        let retriever = retriever(Arc::new(store));

        let results = retriever
            .search(
                "Hampi is famous for its ancient temples and ruins",
                SearchMode::Semantic,
                1,
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "Hampi");
    }

    #[tokio::test]
    async fn test_hybrid_returns_at_most_limit() {
        let store = seeded_store(&[
            ("Hampi", "Hampi temples and ruins"),
            ("Goa", "Goa beaches and temples"),
            ("Jaipur", "Jaipur forts and palaces"),
        ])
        .await;
        let retriever = retriever(Arc::new(store));

        let results = retriever
            .search("temples", SearchMode::Hybrid, 2)
            .await
            .unwrap();
        assert!(results.len() <= 2);
        assert!(!results.is_empty());
    }
}
