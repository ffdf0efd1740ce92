use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RerankError;
use crate::embedding::{CrossEncoder, Embedder, cosine_similarity};

/// Which strategy produced the final candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankTierKind {
    CrossEncoder,
    Embedding,
    /// No scorer succeeded; input order kept.
    PassThrough,
    /// Reranking was disabled for the request.
    Skipped,
}

impl RerankTierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RerankTierKind::CrossEncoder => "cross_encoder",
            RerankTierKind::Embedding => "embedding",
            RerankTierKind::PassThrough => "pass_through",
            RerankTierKind::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RerankTierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoring strategy in the reranker's fallback chain.
#[async_trait]
pub trait RerankTier: Send + Sync {
    fn kind(&self) -> RerankTierKind;

    /// One score per passage, in passage order, higher is better.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError>;
}

#[inline]
pub fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[inline]
pub fn remap_cosine(cosine: f32) -> f32 {
    ((cosine + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Scores pairs with a [`CrossEncoder`] on the blocking pool.
pub struct CrossEncoderTier {
    encoder: Arc<dyn CrossEncoder>,
    squash: bool,
}

impl CrossEncoderTier {
    pub fn new(encoder: Arc<dyn CrossEncoder>, squash: bool) -> Self {
        Self { encoder, squash }
    }
}

#[async_trait]
impl RerankTier for CrossEncoderTier {
    fn kind(&self) -> RerankTierKind {
        RerankTierKind::CrossEncoder
    }

    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError> {
        let encoder = Arc::clone(&self.encoder);
        let query = query.to_string();
        let passages = passages.to_vec();

        let raw = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = passages.iter().map(String::as_str).collect();
            encoder.score_batch(&query, &refs)
        })
        .await
        .map_err(|e| RerankError::TaskFailed {
            reason: e.to_string(),
        })??;

        Ok(if self.squash {
            raw.into_iter().map(logistic).collect()
        } else {
            raw
        })
    }
}

/// Scores by cosine similarity between query and passage embeddings.
pub struct EmbeddingTier {
    embedder: Arc<dyn Embedder>,
    remap: bool,
}

impl EmbeddingTier {
    pub fn new(embedder: Arc<dyn Embedder>, remap: bool) -> Self {
        Self { embedder, remap }
    }
}

#[async_trait]
impl RerankTier for EmbeddingTier {
    fn kind(&self) -> RerankTierKind {
        RerankTierKind::Embedding
    }

    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RerankError> {
        let query_vec = self.embedder.embed(query).await?;
        let passage_vecs = self.embedder.embed_batch(passages).await?;

        Ok(passage_vecs
            .iter()
            .map(|v| {
                let cosine = cosine_similarity(&query_vec, v);
                if self.remap {
                    remap_cosine(cosine)
                } else {
                    cosine
                }
            })
            .collect())
    }
}
