use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::RetrievalConfig;
use super::diversity::DiversityPenalizer;
use super::fusion::ScoreFusion;
use super::Retriever;
use crate::types::{RankedCandidate, RetrievalHit, RetrievalMethod};

/// Dense + sparse retrieval, fused and diversity-penalized.
///
/// Both backends are queried concurrently. A backend that errors or times out contributes
/// nothing; the other side still fuses.
pub struct HybridRetriever {
    dense: Arc<dyn Retriever>,
    sparse: Arc<dyn Retriever>,
    fusion: ScoreFusion,
    diversity: DiversityPenalizer,
    timeout: Duration,
}

impl std::fmt::Debug for HybridRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("fusion", &self.fusion)
            .field("diversity", &self.diversity)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HybridRetriever {
    pub fn new(
        dense: Arc<dyn Retriever>,
        sparse: Arc<dyn Retriever>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            dense,
            sparse,
            fusion: ScoreFusion::new(config.fusion),
            diversity: DiversityPenalizer::new(config.diversity_penalty),
            timeout: config.timeout,
        }
    }

    /// Returns up to `depth` candidates for `query` within `document_id`.
    pub async fn retrieve(
        &self,
        document_id: &str,
        query: &str,
        depth: usize,
    ) -> Vec<RankedCandidate> {
        let (dense, sparse) = tokio::join!(
            self.query_side(&self.dense, RetrievalMethod::Dense, document_id, query, depth),
            self.query_side(&self.sparse, RetrievalMethod::Sparse, document_id, query, depth),
        );

        let dense_count = dense.len();
        let sparse_count = sparse.len();

        let ranked: Vec<RankedCandidate> = self
            .fusion
            .fuse(dense, sparse)
            .into_iter()
            .map(RankedCandidate::from)
            .collect();

        let mut ranked = self.diversity.apply(ranked);
        ranked.truncate(depth);

        info!(
            document_id,
            dense = dense_count,
            sparse = sparse_count,
            returned = ranked.len(),
            "Hybrid retrieval complete"
        );

        ranked
    }

    async fn query_side(
        &self,
        retriever: &Arc<dyn Retriever>,
        method: RetrievalMethod,
        document_id: &str,
        query: &str,
        depth: usize,
    ) -> Vec<RetrievalHit> {
        match tokio::time::timeout(self.timeout, retriever.query(document_id, query, depth)).await
        {
            Ok(Ok(mut hits)) => {
                for hit in &mut hits {
                    hit.method = method;
                }
                debug!(method = %method, hits = hits.len(), "Retriever returned");
                hits
            }
            Ok(Err(e)) => {
                warn!(method = %method, error = %e, "Retriever failed, continuing without it");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    method = %method,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Retriever timed out, continuing without it"
                );
                Vec::new()
            }
        }
    }
}
