use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{RetrievalError, RetrievalResult, Retriever};
use crate::types::RetrievalHit;

/// Returns a fixed hit list, optionally failing or stalling.
#[derive(Debug, Default)]
pub struct MockRetriever {
    hits: Vec<RetrievalHit>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRetriever {
    pub fn new(hits: Vec<RetrievalHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn query(
        &self,
        document_id: &str,
        _query: &str,
        top_k: usize,
    ) -> RetrievalResult<Vec<RetrievalHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(RetrievalError::SearchFailed {
                backend: "mock",
                message: "mock retriever configured to fail".to_string(),
            });
        }

        Ok(self
            .hits
            .iter()
            .filter(|h| h.chunk.document_id() == document_id)
            .take(top_k)
            .cloned()
            .collect())
    }
}
