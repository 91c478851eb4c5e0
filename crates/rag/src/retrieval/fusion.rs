//! Reciprocal Rank Fusion (RRF) for combining search results
//!
//! RRF needs no score normalization and is robust to the very different
//! scoring distributions of dense similarity and sparse term matching.

use crate::store::ScoredPoint;
use std::cmp::Ordering;
use std::collections::HashMap;

/// RRF fusion parameters
#[derive(Debug, Clone)]
pub struct RrfFusion {
    /// Dampening constant (typically 60)
    pub k: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self { k: 60.0 }
    }
}

/// Result of fusion
#[derive(Debug, Clone)]
pub struct FusedPoint {
    pub point: ScoredPoint,
    pub dense_rank: Option<usize>,
    pub sparse_rank: Option<usize>,
    pub rrf_score: f32,
}

impl RrfFusion {
    pub fn new(k: f32) -> Self {
        Self { k }
    }

    /// Fuse dense and sparse ranked lists
    ///
    /// Each point's fused score is the sum of `1 / (k + rank)` over every
    /// list it appears in, with 1-based ranks. Points present in both lists
    /// collect both contributions. Ties order by dense rank (present before
    /// absent), then sparse rank, so the output is deterministic.
    pub fn fuse(
        &self,
        dense_results: Vec<ScoredPoint>,
        sparse_results: Vec<ScoredPoint>,
        limit: usize,
    ) -> Vec<FusedPoint> {
        let mut by_id: HashMap<String, (ScoredPoint, Option<usize>, Option<usize>)> =
            HashMap::new();

        for (rank, point) in dense_results.into_iter().enumerate() {
            by_id.insert(point.id.clone(), (point, Some(rank + 1), None));
        }

        for (rank, point) in sparse_results.into_iter().enumerate() {
            match by_id.get_mut(&point.id) {
                Some((_, _, sparse_rank)) => {
                    *sparse_rank = Some(rank + 1);
                }
                None => {
                    by_id.insert(point.id.clone(), (point, None, Some(rank + 1)));
                }
            }
        }

        let mut results: Vec<FusedPoint> = by_id
            .into_values()
            .map(|(mut point, dense_rank, sparse_rank)| {
                let rrf_score = reciprocal(self.k, dense_rank) + reciprocal(self.k, sparse_rank);
                point.score = rrf_score;
                FusedPoint {
                    point,
                    dense_rank,
                    sparse_rank,
                    rrf_score,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.rrf_score
                .partial_cmp(&a.rrf_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| rank_key(a.dense_rank).cmp(&rank_key(b.dense_rank)))
                .then_with(|| rank_key(a.sparse_rank).cmp(&rank_key(b.sparse_rank)))
        });

        results.truncate(limit);
        results
    }
}

fn reciprocal(k: f32, rank: Option<usize>) -> f32 {
    rank.map(|r| 1.0 / (k + r as f32)).unwrap_or(0.0)
}

fn rank_key(rank: Option<usize>) -> usize {
    rank.unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChunkPayload;

    fn point(id: &str, score: f32) -> ScoredPoint {
        ScoredPoint {
            id: id.to_string(),
            score,
            payload: ChunkPayload::default(),
        }
    }

    #[test]
    fn test_rrf_scores_with_toy_constant() {
        // Dense: [A, B, C]; sparse: [B, A, D]; k = 1.
        // A = 1/(1+1) + 1/(1+2) = 0.8333...
        // B = 1/(1+2) + 1/(1+1) = 0.8333...
        // C = 1/(1+3) = 0.25, D = 1/(1+3) = 0.25
        let fusion = RrfFusion::new(1.0);

        let dense = vec![point("a", 0.9), point("b", 0.8), point("c", 0.7)];
        let sparse = vec![point("b", 12.0), point("a", 9.0), point("d", 3.0)];

        let fused = fusion.fuse(dense, sparse, 10);
        assert_eq!(fused.len(), 4);

        assert!((fused[0].rrf_score - (1.0 / 2.0 + 1.0 / 3.0)).abs() < 1e-6);
        assert!((fused[1].rrf_score - (1.0 / 2.0 + 1.0 / 3.0)).abs() < 1e-6);
        assert!((fused[2].rrf_score - 0.25).abs() < 1e-6);
        assert!((fused[3].rrf_score - 0.25).abs() < 1e-6);

        // {A, B} above {C, D}
        let top: Vec<&str> = fused[..2].iter().map(|f| f.point.id.as_str()).collect();
        assert!(top.contains(&"a") && top.contains(&"b"));
    }

    #[test]
    fn test_ties_break_by_dense_rank() {
        let fusion = RrfFusion::new(1.0);

        let dense = vec![point("a", 0.9), point("b", 0.8), point("c", 0.7)];
        let sparse = vec![point("b", 12.0), point("a", 9.0), point("d", 3.0)];

        let fused = fusion.fuse(dense, sparse, 10);

        // A and B tie on score; A has the better dense rank.
        assert_eq!(fused[0].point.id, "a");
        assert_eq!(fused[1].point.id, "b");
        // C (dense rank 3) ties with D (no dense rank); C wins.
        assert_eq!(fused[2].point.id, "c");
        assert_eq!(fused[3].point.id, "d");
    }

    #[test]
    fn test_point_in_both_lists_gets_both_contributions() {
        let fusion = RrfFusion::default();

        let dense = vec![point("x", 0.9), point("y", 0.5)];
        let sparse = vec![point("x", 4.0)];

        let fused = fusion.fuse(dense, sparse, 10);
        let x = fused.iter().find(|f| f.point.id == "x").unwrap();
        assert_eq!(x.dense_rank, Some(1));
        assert_eq!(x.sparse_rank, Some(1));
        assert!((x.rrf_score - 2.0 / 61.0).abs() < 1e-6);
    }

    #[test]
    fn test_limit_applies_after_fusion() {
        let fusion = RrfFusion::default();
        let dense = vec![point("a", 0.9), point("b", 0.8)];
        let sparse = vec![point("c", 5.0), point("d", 4.0)];

        let fused = fusion.fuse(dense, sparse, 2);
        assert_eq!(fused.len(), 2);
    }
}
