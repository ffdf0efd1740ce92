//! Deterministic in-process stand-ins for the embedding and cross-encoder collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::Embedder;
use super::cross_encoder::{CrossEncoder, CrossEncoderError};
use super::error::EmbeddingError;
use crate::hashing::hash_text;
use crate::text::token_set;

/// Hashed bag-of-words embedder: identical texts embed identically, and texts sharing
/// words have positive cosine similarity.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// An embedder whose every call fails.
    pub fn failing(dim: usize) -> Self {
        let embedder = Self::new(dim);
        embedder.set_failing(true);
        embedder
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in token_set(text) {
            let hash = hash_text(&token);
            let bucket = u64::from_le_bytes([
                hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
            ]) as usize
                % self.dim;
            v[bucket] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::RequestFailed {
                url: "mock://embedder".to_string(),
                message: "mock embedder configured to fail".to_string(),
            });
        }
        Ok(self.vectorize(text))
    }
}

type ScoreFn = dyn Fn(&str, &str) -> f32 + Send + Sync;

/// Cross-encoder stand-in. Scores with a closure, or by query-token overlap by default.
#[derive(Clone)]
pub struct MockCrossEncoder {
    scorer: Arc<ScoreFn>,
    failing: bool,
}

impl std::fmt::Debug for MockCrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCrossEncoder")
            .field("failing", &self.failing)
            .finish()
    }
}

impl Default for MockCrossEncoder {
    fn default() -> Self {
        Self::lexical()
    }
}

impl MockCrossEncoder {
    /// Logit-like score: `8 * (overlap - 0.5)`, where overlap is the share of query
    /// tokens found in the passage.
    pub fn lexical() -> Self {
        Self::with_scorer(|query, passage| {
            let query_tokens = token_set(query);
            if query_tokens.is_empty() {
                return -4.0;
            }
            let passage_tokens = token_set(passage);
            let overlap = query_tokens.intersection(&passage_tokens).count() as f32
                / query_tokens.len() as f32;
            8.0 * (overlap - 0.5)
        })
    }

    pub fn with_scorer<F>(scorer: F) -> Self
    where
        F: Fn(&str, &str) -> f32 + Send + Sync + 'static,
    {
        Self {
            scorer: Arc::new(scorer),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::lexical()
        }
    }
}

impl CrossEncoder for MockCrossEncoder {
    fn score(&self, query: &str, passage: &str) -> Result<f32, CrossEncoderError> {
        if self.failing {
            return Err(CrossEncoderError::InferenceFailed {
                reason: "mock cross-encoder configured to fail".to_string(),
            });
        }
        Ok((self.scorer)(query, passage))
    }
}
