use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLABORATOR_TIMEOUT_MS, DEFAULT_MAX_ANSWER_CHARS, DEFAULT_MAX_CONTEXT_TOKENS,
    DEFAULT_SNIPPET_CHARS,
};
use crate::generation::GenerationParams;

/// Settings for [`super::Pipeline`] that do not vary per request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Estimated-token budget for the context block of the prompt.
    pub max_context_tokens: usize,
    /// Per-candidate snippet length in the prompt.
    pub snippet_chars: usize,
    /// Final answer hard limit, before the citation block.
    pub max_answer_chars: usize,
    /// Bound for the refine and generate calls.
    pub timeout: Duration,
    pub generation: GenerationParams,
    /// Append an "Answer Confidence" footer built from the final verdict.
    pub append_confidence: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            generation: GenerationParams::default(),
            append_confidence: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_context_tokens(mut self, tokens: usize) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    pub fn with_max_answer_chars(mut self, chars: usize) -> Self {
        self.max_answer_chars = chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_generation(mut self, params: GenerationParams) -> Self {
        self.generation = params;
        self
    }

    pub fn with_append_confidence(mut self, append: bool) -> Self {
        self.append_confidence = append;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_context_tokens == 0 {
            return Err("max_context_tokens must be > 0".to_string());
        }
        if self.snippet_chars == 0 {
            return Err("snippet_chars must be > 0".to_string());
        }
        if self.max_answer_chars == 0 {
            return Err("max_answer_chars must be > 0".to_string());
        }
        if self.timeout.is_zero() {
            return Err("pipeline timeout must be > 0".to_string());
        }
        if self.generation.max_tokens == 0 {
            return Err("generation max_tokens must be > 0".to_string());
        }
        if !self.generation.temperature.is_finite() || self.generation.temperature < 0.0 {
            return Err(format!(
                "generation temperature must be >= 0.0, got {}",
                self.generation.temperature
            ));
        }
        Ok(())
    }
}
