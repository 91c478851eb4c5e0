//! Qdrant-backed vector store
//!
//! Speaks the Qdrant REST query API against a collection with two named
//! vectors (dense + sparse). The collection itself is provisioned by the
//! indexing job, not by this service.

use super::{ChunkPayload, ScoredPoint, SparseVector, VectorStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wayfarer_common::config::QdrantConfig;
use wayfarer_common::errors::{AppError, Result};

/// Vector store client for a Qdrant collection
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    dense_vector: String,
    sparse_vector: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: QueryVector<'a>,
    using: &'a str,
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum QueryVector<'a> {
    Dense(&'a [f32]),
    Sparse {
        indices: &'a [u32],
        values: &'a [f32],
    },
}

#[derive(Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<PointWire>,
}

#[derive(Deserialize)]
struct PointWire {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<ChunkPayload>,
}

/// Qdrant point ids are either unsigned integers or UUID strings
#[derive(Deserialize)]
#[serde(untagged)]
enum PointId {
    Num(u64),
    Str(String),
}

impl PointId {
    fn into_string(self) -> String {
        match self {
            PointId::Num(n) => n.to_string(),
            PointId::Str(s) => s,
        }
    }
}

impl QdrantStore {
    /// Create a new store client
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            dense_vector: config.dense_vector.clone(),
            sparse_vector: config.sparse_vector.clone(),
        })
    }

    async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<ScoredPoint>> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.base_url, self.collection
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Query request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store {
                message: format!("Query error {}: {}", status, body),
            });
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| AppError::Store {
            message: format!("Failed to parse query response: {}", e),
        })?;

        Ok(parsed
            .result
            .points
            .into_iter()
            .map(|p| ScoredPoint {
                id: p.id.into_string(),
                score: p.score,
                payload: p.payload.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    async fn query_dense(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.query(&QueryRequest {
            query: QueryVector::Dense(vector),
            using: &self.dense_vector,
            limit,
            with_payload: true,
        })
        .await
    }

    async fn query_sparse(&self, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        self.query(&QueryRequest {
            query: QueryVector::Sparse {
                indices: &query.indices,
                values: &query.values,
            },
            using: &self.sparse_vector,
            limit,
            with_payload: true,
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Ping failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Store {
                message: format!("Collection not reachable: {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_query_wire_shape() {
        let vector = vec![0.1_f32, 0.2, 0.3];
        let request = QueryRequest {
            query: QueryVector::Dense(&vector),
            using: "jina-small",
            limit: 5,
            with_payload: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["using"], "jina-small");
        assert_eq!(json["limit"], 5);
        assert_eq!(json["query"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_sparse_query_wire_shape() {
        let sparse = SparseVector {
            indices: vec![7, 42],
            values: vec![1.0, 2.0],
        };
        let request = QueryRequest {
            query: QueryVector::Sparse {
                indices: &sparse.indices,
                values: &sparse.values,
            },
            using: "bm25",
            limit: 10,
            with_payload: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"]["indices"][1], 42);
        assert_eq!(json["query"]["values"][1], 2.0);
    }

    #[test]
    fn test_point_id_forms() {
        let numeric: PointWire = serde_json::from_str(r#"{"id": 12, "score": 0.5}"#).unwrap();
        assert_eq!(numeric.id.into_string(), "12");

        let uuid: PointWire =
            serde_json::from_str(r#"{"id": "3f2b", "score": 0.5, "payload": {"content": "c"}}"#)
                .unwrap();
        assert_eq!(uuid.id.into_string(), "3f2b");
        assert_eq!(uuid.payload.unwrap().content, "c");
    }
}
