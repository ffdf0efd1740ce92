use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLABORATOR_TIMEOUT_MS, JUDGE_MAX_TOKENS, JUDGE_SNIPPET_CHARS,
    JUDGE_SUPPORTED_FLOOR, JUDGE_UNSUPPORTED_CAP,
};

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeConfig {
    /// Floor applied when the judge model says the answer is supported.
    pub supported_floor: f32,
    /// Cap applied when the judge model says it is not.
    pub unsupported_cap: f32,
    /// Per-candidate snippet length shown to the judge model.
    pub snippet_chars: usize,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            supported_floor: JUDGE_SUPPORTED_FLOOR,
            unsupported_cap: JUDGE_UNSUPPORTED_CAP,
            snippet_chars: JUDGE_SNIPPET_CHARS,
            max_tokens: JUDGE_MAX_TOKENS,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }
}

impl JudgeConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("supported_floor", self.supported_floor),
            ("unsupported_cap", self.unsupported_cap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0, got {}", name, value));
            }
        }
        if self.timeout.is_zero() {
            return Err("judge timeout must be > 0".to_string());
        }
        Ok(())
    }
}
