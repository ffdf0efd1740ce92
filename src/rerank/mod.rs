//! Second-pass reranking with an ordered capability fallback.
//!
//! Tiers are chosen once, at construction, from whichever collaborators are available:
//! cross-encoder first, then embedding similarity. At rerank time each tier is tried in
//! order; an error, a timeout or a wrong score count moves on to the next one. When none
//! succeeds the input order is kept.

pub mod config;
pub mod error;
pub mod tier;


pub use config::RerankConfig;
pub use error::RerankError;
pub use tier::{
    CrossEncoderTier, EmbeddingTier, RerankTier, RerankTierKind, logistic, remap_cosine,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::{CrossEncoder, Embedder};
use crate::types::RankedCandidate;

/// Reranked candidates plus the tier that ordered them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankOutcome {
    pub candidates: Vec<RankedCandidate>,
    pub tier: RerankTierKind,
}

pub struct Reranker {
    tiers: Vec<Box<dyn RerankTier>>,
    config: RerankConfig,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("tiers", &self.tiers())
            .field("config", &self.config)
            .finish()
    }
}

impl Reranker {
    pub fn new(tiers: Vec<Box<dyn RerankTier>>, config: RerankConfig) -> Self {
        Self { tiers, config }
    }

    /// A reranker with no scoring tiers.
    pub fn passthrough() -> Self {
        Self::new(Vec::new(), RerankConfig::default())
    }

    /// Builds the tier chain from whichever collaborators are present.
    pub fn from_capabilities(
        cross_encoder: Option<Arc<dyn CrossEncoder>>,
        embedder: Option<Arc<dyn Embedder>>,
        config: RerankConfig,
    ) -> Self {
        let mut tiers: Vec<Box<dyn RerankTier>> = Vec::new();
        if let Some(encoder) = cross_encoder {
            tiers.push(Box::new(CrossEncoderTier::new(encoder, config.squash_logits)));
        }
        if let Some(embedder) = embedder {
            tiers.push(Box::new(EmbeddingTier::new(embedder, config.remap_cosine)));
        }

        let reranker = Self::new(tiers, config);
        info!(tiers = ?reranker.tiers(), "Reranker initialized");
        reranker
    }

    /// Tier order, best first.
    pub fn tiers(&self) -> Vec<RerankTierKind> {
        self.tiers.iter().map(|t| t.kind()).collect()
    }

    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    /// Scores, re-orders (stable, descending) and truncates `candidates` to `top_k`.
    pub async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<RankedCandidate>,
        top_k: usize,
    ) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome {
                candidates,
                tier: RerankTierKind::PassThrough,
            };
        }

        let passages: Vec<String> = candidates.iter().map(|c| c.text().to_string()).collect();

        for tier in &self.tiers {
            let kind = tier.kind();
            match self.score_with(tier.as_ref(), query, &passages).await {
                Ok(scores) => {
                    for (candidate, score) in candidates.iter_mut().zip(scores) {
                        candidate.rerank_score = Some(score);
                    }
                    candidates.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));
                    candidates.truncate(top_k);

                    info!(
                        tier = %kind,
                        returned = candidates.len(),
                        top = candidates.first().map(|c| c.final_score()),
                        "Reranked candidates"
                    );
                    return RerankOutcome {
                        candidates,
                        tier: kind,
                    };
                }
                Err(e) => {
                    warn!(tier = %kind, error = %e, "Rerank tier failed, trying next");
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            "No rerank tier produced scores, keeping input order"
        );
        candidates.truncate(top_k);
        RerankOutcome {
            candidates,
            tier: RerankTierKind::PassThrough,
        }
    }

    async fn score_with(
        &self,
        tier: &dyn RerankTier,
        query: &str,
        passages: &[String],
    ) -> Result<Vec<f32>, RerankError> {
        let scores = tokio::time::timeout(self.config.timeout, tier.score(query, passages))
            .await
            .map_err(|_| RerankError::Timeout {
                tier: tier.kind().as_str(),
                timeout_ms: self.config.timeout.as_millis() as u64,
            })??;

        if scores.len() != passages.len() {
            return Err(RerankError::ScoreCountMismatch {
                expected: passages.len(),
                actual: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(RerankError::NonFiniteScore);
        }
        Ok(scores)
    }
}
