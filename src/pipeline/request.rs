use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_JUDGE_THRESHOLD, DEFAULT_MAX_ATTEMPTS, DEFAULT_TOP_K};
use crate::judge::normalize_threshold;

/// One question against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub document_id: String,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rerank")]
    pub rerank_enabled: bool,
    /// Minimum acceptable judge score on `[0, 1]`; percent values are accepted and scaled.
    #[serde(default = "default_threshold")]
    pub judge_threshold: f32,
    /// Maximum number of low-confidence retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub debug: bool,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_rerank() -> bool {
    true
}

fn default_threshold() -> f32 {
    DEFAULT_JUDGE_THRESHOLD
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl PipelineRequest {
    pub fn new(document_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            rerank_enabled: true,
            judge_threshold: DEFAULT_JUDGE_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            debug: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_rerank(mut self, enabled: bool) -> Self {
        self.rerank_enabled = enabled;
        self
    }

    /// Accepts `0.7` or `70`.
    pub fn with_judge_threshold(mut self, threshold: f32) -> Self {
        self.judge_threshold = normalize_threshold(threshold);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Threshold on `[0, 1]` regardless of how it was supplied.
    pub fn threshold(&self) -> f32 {
        normalize_threshold(self.judge_threshold)
    }
}
