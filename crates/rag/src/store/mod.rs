//! Vector store access
//!
//! The document collection is written once at indexing time and queried many
//! times during serving. Each chunk carries one named dense vector and one
//! named sparse vector; this module exposes the two nearest-neighbor query
//! shapes the retriever consumes.

mod memory;
mod qdrant;

pub use memory::{MemoryChunk, MemoryStore};
pub use qdrant::QdrantStore;

use serde::{Deserialize, Serialize};
use wayfarer_common::errors::Result;

/// Payload stored alongside the vectors for every chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Chunk text
    #[serde(default)]
    pub content: String,

    /// Free-text location tag (e.g. "Hampi, Karnataka")
    #[serde(default)]
    pub location: String,

    /// Source document reference
    #[serde(default)]
    pub doc_id: String,
}

/// A single ranked hit from a store query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Chunk id
    pub id: String,

    /// Similarity score; semantics depend on the queried vector
    pub score: f32,

    /// Chunk payload
    pub payload: ChunkPayload,
}

/// Sparse term-weight vector (most terms zero, only nonzero entries stored)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Term ids, strictly increasing
    pub indices: Vec<u32>,

    /// Weight per term id, same length as `indices`
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Common trait for vector store backends
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest neighbors of a dense query vector, by cosine similarity
    async fn query_dense(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Nearest neighbors of a sparse query, by term-weight dot product
    async fn query_sparse(&self, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Cheap reachability probe for readiness checks
    async fn ping(&self) -> Result<()>;
}
