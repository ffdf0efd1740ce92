//! Weighted fusion of dense and sparse hit lists.
//!
//! Both lists are normalized against one pooled min/max so a BM25 score of `5.0` and a
//! cosine of `0.9` land on the same `[0, 1]` scale before weighting.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::config::FusionConfig;
use crate::constants::NEUTRAL_SCORE;
use crate::types::{DedupeKey, FusedCandidate, RetrievalHit, RetrievalMethod};

/// Min/max over every score in both lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f32,
    pub max: f32,
}

impl ScoreRange {
    pub fn of<'a>(scores: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        scores.into_iter().fold(None, |range, &s| match range {
            None => Some(Self { min: s, max: s }),
            Some(r) => Some(Self {
                min: r.min.min(s),
                max: r.max.max(s),
            }),
        })
    }

    /// Maps `score` into `[0, 1]`; a zero-width range maps everything to the neutral score.
    pub fn normalize(&self, score: f32) -> f32 {
        let spread = self.max - self.min;
        if spread > 0.0 {
            ((score - self.min) / spread).clamp(0.0, 1.0)
        } else {
            NEUTRAL_SCORE
        }
    }
}

/// Normalizes two score lists against their pooled range.
pub fn joint_normalize(dense: &[f32], sparse: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let Some(range) = ScoreRange::of(dense.iter().chain(sparse.iter())) else {
        return (Vec::new(), Vec::new());
    };
    (
        dense.iter().map(|&s| range.normalize(s)).collect(),
        sparse.iter().map(|&s| range.normalize(s)).collect(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct ScoreFusion {
    config: FusionConfig,
}

impl ScoreFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    fn weight(&self, method: RetrievalMethod) -> f32 {
        match method {
            RetrievalMethod::Dense => self.config.dense_weight,
            RetrievalMethod::Sparse => self.config.sparse_weight(),
        }
    }

    /// Merges both lists into one ranking, one entry per [`DedupeKey`].
    ///
    /// The first occurrence of a chunk (dense side first) is kept as its representative.
    /// Ties keep first-seen order.
    pub fn fuse(&self, dense: Vec<RetrievalHit>, sparse: Vec<RetrievalHit>) -> Vec<FusedCandidate> {
        let hits: Vec<RetrievalHit> = dense
            .into_iter()
            .chain(sparse)
            .filter(|hit| {
                let finite = hit.score.is_finite();
                if !finite {
                    warn!(
                        chunk_id = %hit.chunk.id(),
                        method = %hit.method,
                        "Dropping hit with non-finite score"
                    );
                }
                finite
            })
            .collect();

        let Some(range) = ScoreRange::of(hits.iter().map(|h| &h.score)) else {
            return Vec::new();
        };

        let mut index: HashMap<DedupeKey, usize> = HashMap::with_capacity(hits.len());
        let mut fused: Vec<FusedCandidate> = Vec::with_capacity(hits.len());

        for hit in hits {
            let contribution = self.weight(hit.method) * range.normalize(hit.score);
            let key = hit.chunk.dedupe_key();

            match index.get(&key) {
                Some(&pos) => fused[pos].score += contribution,
                None => {
                    index.insert(key.clone(), fused.len());
                    fused.push(FusedCandidate {
                        chunk: hit.chunk,
                        key,
                        score: contribution,
                    });
                }
            }
        }

        fused.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            candidates = fused.len(),
            min = range.min,
            max = range.max,
            top = fused.first().map(|c| c.score),
            "Fused retrieval hits"
        );

        fused
    }
}
