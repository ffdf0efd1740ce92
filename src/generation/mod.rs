//! Text generation: the [`Generator`] collaborator, its [`genai`](self::genai) adapter, and
//! the context-window prompt builder.

pub mod error;
pub mod genai;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompt;

pub use error::GenerationError;
pub use genai::{DEFAULT_GENERATION_MODEL, GenAiConfig, GenAiGenerator};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;
pub use prompt::{ContextPrompt, PromptBuilder, RETRY_INSTRUCTION};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GENERATION_MAX_TOKENS, DEFAULT_GENERATION_TEMPERATURE};

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_GENERATION_MAX_TOKENS,
            temperature: DEFAULT_GENERATION_TEMPERATURE,
        }
    }
}

impl GenerationParams {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Language-model collaborator.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError>;
}

/// Runs `generator` bounded by `timeout`.
pub async fn generate_within(
    generator: &dyn Generator,
    prompt: &str,
    params: GenerationParams,
    timeout: Duration,
) -> Result<String, GenerationError> {
    tokio::time::timeout(timeout, generator.generate(prompt, params))
        .await
        .map_err(|_| GenerationError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })?
}
