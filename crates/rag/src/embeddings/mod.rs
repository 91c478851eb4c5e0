//! Query embedding
//!
//! Dense embeddings come from an OpenAI-compatible embeddings endpoint; the
//! sparse side is a local BM25-style term encoder. Both are deterministic:
//! the same query text always produces the same vectors.

use crate::store::SparseVector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use wayfarer_common::config::EmbeddingConfig;
use wayfarer_common::errors::{AppError, Result};
use wayfarer_common::metrics::METRICS_PREFIX;

/// Trait for dense query embedding
#[async_trait::async_trait]
pub trait DenseEmbedder: Send + Sync {
    /// Generate the dense embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create a new embedder client
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            max_retries: config.max_retries,
        })
    }

    /// Make request with retry
    async fn request_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Embedding request failed, retrying"
                    );
                    metrics::counter!(format!("{}_embedding_errors_total", METRICS_PREFIX))
                        .increment(1);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Embedding {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.endpoint);

        let request = EmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| AppError::Embedding {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: EmbeddingResponse =
            response.json().await.map_err(|e| AppError::Embedding {
                message: format!("Failed to parse response: {}", e),
            })?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding {
                message: "Empty response".to_string(),
            })
    }
}

#[async_trait::async_trait]
impl DenseEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.request_with_retry(text).await?;
        if embedding.len() != self.dimension {
            return Err(AppError::Embedding {
                message: format!(
                    "Expected {}-dim embedding, got {}",
                    self.dimension,
                    embedding.len()
                ),
            });
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Deterministic embedder for tests and offline runs
///
/// Folds each token into a fixed-dimension vector via its SHA-256 digest,
/// then L2-normalizes. Identical text always maps to an identical vector.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait::async_trait]
impl DenseEmbedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                    % self.dimension;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-embedding"
    }
}

/// BM25-style sparse query encoder
///
/// Term id = first four bytes of the term's SHA-256 digest; value = term
/// frequency within the query. IDF weighting lives on the stored side of the
/// collection, fixed at indexing time.
#[derive(Debug, Clone, Default)]
pub struct SparseEncoder;

impl SparseEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, text: &str) -> SparseVector {
        let mut weights: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            *weights.entry(term_id(&token)).or_insert(0.0) += 1.0;
        }

        SparseVector {
            indices: weights.keys().copied().collect(),
            values: weights.values().copied().collect(),
        }
    }
}

/// Lowercase alphanumeric tokens, terms shorter than 3 chars dropped
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
}

fn term_id(term: &str) -> u32 {
    let digest = Sha256::digest(term.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(16);
        let a = embedder.embed("temples of Hampi").await.unwrap();
        let b = embedder.embed("temples of Hampi").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn test_hash_embedder_is_normalized() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("beaches and backwaters").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sparse_encoder_is_deterministic() {
        let encoder = SparseEncoder::new();
        let a = encoder.encode("best time to visit Hampi");
        let b = encoder.encode("best time to visit Hampi");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sparse_encoder_drops_short_terms() {
        let encoder = SparseEncoder::new();
        // "to" and "in" are below the length threshold
        let encoded = encoder.encode("to in temples");
        assert_eq!(encoded.indices.len(), 1);
    }

    #[test]
    fn test_sparse_encoder_counts_term_frequency() {
        let encoder = SparseEncoder::new();
        let encoded = encoder.encode("temples temples ruins");
        assert_eq!(encoded.indices.len(), 2);
        assert!(encoded.values.contains(&2.0));
        assert!(encoded.values.contains(&1.0));
    }

    #[test]
    fn test_sparse_indices_strictly_increasing() {
        let encoder = SparseEncoder::new();
        let encoded = encoder.encode("forts palaces markets rivers");
        let mut sorted = encoded.indices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(encoded.indices, sorted);
    }
}
