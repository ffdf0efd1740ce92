//! Embedding + model utilities.
//!
//! - [`Embedder`] is the embedding-service collaborator (dense retrieval and the
//!   reranker's embedding tier).
//! - [`http`] talks to an OpenAI-compatible `/v1/embeddings` endpoint.
//! - [`cross_encoder`] provides the optional cross-encoder used by [`crate::rerank`].

/// BERT classifier wrapper used by the cross-encoder.
pub mod bert;
/// Cross-encoder text-pair comparator.
pub mod cross_encoder;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// HTTP embedding client.
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Tokenizer/model loading helpers.
pub mod utils;

pub use cross_encoder::{BertCrossEncoder, CrossEncoder, CrossEncoderConfig, CrossEncoderError};
pub use error::EmbeddingError;
pub use http::{HttpEmbedder, HttpEmbedderConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCrossEncoder, MockEmbedder};

use async_trait::async_trait;

/// Embedding-service collaborator.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Cosine similarity in `[-1, 1]`; `0.0` for empty, zero-norm or mismatched inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}
