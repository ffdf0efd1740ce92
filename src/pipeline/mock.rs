use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::QueryRefiner;
use crate::generation::GenerationError;

/// Refiner returning a fixed rewrite, or failing.
#[derive(Debug)]
pub struct MockRefiner {
    output: Result<String, GenerationError>,
    calls: AtomicUsize,
}

impl MockRefiner {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: Ok(output.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: Err(GenerationError::RequestFailed {
                model: "mock-refiner".to_string(),
                message: "refiner unavailable".to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryRefiner for MockRefiner {
    async fn refine(&self, _query: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output.clone()
    }
}
