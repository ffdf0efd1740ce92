use thiserror::Error;

use crate::embedding::{CrossEncoderError, EmbeddingError};

/// Why a rerank tier could not produce scores. Never surfaced to callers: the
/// [`super::Reranker`] logs it and moves to the next tier.
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("cross-encoder failed: {0}")]
    CrossEncoder(#[from] CrossEncoderError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("expected {expected} scores, got {actual}")]
    ScoreCountMismatch { expected: usize, actual: usize },

    #[error("tier returned a non-finite score")]
    NonFiniteScore,

    #[error("{tier} tier timed out after {timeout_ms}ms")]
    Timeout { tier: &'static str, timeout_ms: u64 },

    #[error("scoring task failed: {reason}")]
    TaskFailed { reason: String },
}
