//! Candidate retrieval: the [`Retriever`] collaborator seam, backend adapters, and the
//! hybrid ranking built on top of them.
//!
//! - [`ScoreFusion`] merges dense and sparse hits on a jointly normalized scale.
//! - [`DiversityPenalizer`] demotes repeats from the same page.
//! - [`HybridRetriever`] runs both backends concurrently and applies the two above.
//! - [`QdrantRetriever`] (dense) and [`LexicalIndex`] (sparse, tantivy BM25) are the
//!   concrete backends.

pub mod config;
pub mod diversity;
pub mod error;
pub mod fusion;
pub mod hybrid;
pub mod lexical;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod qdrant;


pub use config::{FusionConfig, RetrievalConfig};
pub use diversity::DiversityPenalizer;
pub use error::{RetrievalError, RetrievalResult};
pub use fusion::{ScoreFusion, ScoreRange, joint_normalize};
pub use hybrid::HybridRetriever;
pub use lexical::LexicalIndex;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRetriever;
pub use qdrant::{DEFAULT_COLLECTION_NAME, QdrantRetriever};

use async_trait::async_trait;

use crate::types::RetrievalHit;

/// A single retrieval backend (dense or sparse).
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns at most `top_k` hits for `query` restricted to `document_id`, best first.
    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: usize,
    ) -> RetrievalResult<Vec<RetrievalHit>>;
}
