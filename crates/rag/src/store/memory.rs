//! In-memory vector store
//!
//! Holds seeded chunks with their dense and sparse vectors. Used by tests
//! and for local development without a running Qdrant.

use super::{ChunkPayload, ScoredPoint, SparseVector, VectorStore};
use std::collections::HashMap;
use wayfarer_common::errors::Result;

/// A chunk seeded into the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryChunk {
    pub id: String,
    pub payload: ChunkPayload,
    pub dense: Vec<f32>,
    pub sparse: SparseVector,
}

/// In-process store over a fixed chunk set
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: Vec<MemoryChunk>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(chunks: Vec<MemoryChunk>) -> Self {
        Self { chunks }
    }

    pub fn insert(&mut self, chunk: MemoryChunk) {
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn ranked(&self, mut scored: Vec<ScoredPoint>, limit: usize) -> Vec<ScoredPoint> {
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(limit);
        scored
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn sparse_dot(query: &SparseVector, chunk: &SparseVector) -> f32 {
    let weights: HashMap<u32, f32> = chunk
        .indices
        .iter()
        .copied()
        .zip(chunk.values.iter().copied())
        .collect();
    query
        .indices
        .iter()
        .zip(query.values.iter())
        .filter_map(|(idx, value)| weights.get(idx).map(|w| w * value))
        .sum()
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    async fn query_dense(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let scored = self
            .chunks
            .iter()
            .map(|c| ScoredPoint {
                id: c.id.clone(),
                score: cosine(vector, &c.dense),
                payload: c.payload.clone(),
            })
            .collect();
        Ok(self.ranked(scored, limit))
    }

    async fn query_sparse(&self, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        let scored = self
            .chunks
            .iter()
            .map(|c| ScoredPoint {
                id: c.id.clone(),
                score: sparse_dot(query, &c.sparse),
                payload: c.payload.clone(),
            })
            .filter(|p| p.score > 0.0)
            .collect();
        Ok(self.ranked(scored, limit))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
