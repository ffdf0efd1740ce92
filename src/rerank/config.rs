use std::time::Duration;

use crate::constants::DEFAULT_COLLABORATOR_TIMEOUT_MS;

#[derive(Debug, Clone, PartialEq)]
pub struct RerankConfig {
    /// Squash cross-encoder logits into `[0, 1]` with a logistic function.
    pub squash_logits: bool,
    /// Remap cosine similarity from `[-1, 1]` to `[0, 1]`.
    pub remap_cosine: bool,
    /// Upper bound for one tier's scoring call.
    pub timeout: Duration,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            squash_logits: true,
            remap_cosine: true,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }
}

impl RerankConfig {
    pub fn with_squash_logits(mut self, squash: bool) -> Self {
        self.squash_logits = squash;
        self
    }

    pub fn with_remap_cosine(mut self, remap: bool) -> Self {
        self.remap_cosine = remap;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("rerank timeout must be > 0".to_string());
        }
        Ok(())
    }
}
