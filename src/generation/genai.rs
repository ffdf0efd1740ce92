//! [`Generator`] backed by the `genai` multi-provider client.
//!
//! The model name selects the provider (`gpt-*` → OpenAI, `claude-*` → Anthropic, names
//! with a tag such as `qwen2.5:3b` → Ollama); credentials come from the provider's usual
//! environment variables.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, warn};

use super::{GenerationError, GenerationParams, Generator};

pub const DEFAULT_GENERATION_MODEL: &str = "qwen2.5:3b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenAiConfig {
    pub model: String,
    /// Optional system message sent before every prompt.
    pub system_prompt: Option<String>,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            system_prompt: None,
        }
    }
}

impl GenAiConfig {
    pub const ENV_MODEL: &'static str = "RAGLINE_GENERATION_MODEL";

    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn from_env() -> Self {
        let model = std::env::var(Self::ENV_MODEL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string());
        Self::new(model)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.model.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "model cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

pub struct GenAiGenerator {
    client: Client,
    config: GenAiConfig,
}

impl std::fmt::Debug for GenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiGenerator")
            .field("config", &self.config)
            .finish()
    }
}

impl GenAiGenerator {
    pub fn new(config: GenAiConfig) -> Result<Self, GenerationError> {
        Self::with_client(Client::default(), config)
    }

    pub fn with_client(client: Client, config: GenAiConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt.to_string()));
        ChatRequest::new(messages)
    }
}

#[async_trait]
impl Generator for GenAiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        let options = ChatOptions::default()
            .with_max_tokens(params.max_tokens)
            .with_temperature(f64::from(params.temperature));

        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "Calling generation model"
        );

        let response = self
            .client
            .exec_chat(&self.config.model, self.request(prompt), Some(&options))
            .await
            .map_err(|e| {
                warn!(model = %self.config.model, error = %e, "Generation request failed");
                GenerationError::RequestFailed {
                    model: self.config.model.clone(),
                    message: e.to_string(),
                }
            })?;

        Ok(completion_text(&self.config.model, response.first_text()))
    }
}

/// Trimmed completion text. A missing or blank completion is an empty answer, which the
/// judge scores as "no answer" so the retry gate can regenerate it.
fn completion_text(model: &str, text: Option<&str>) -> String {
    let text = text.unwrap_or_default().trim();
    if text.is_empty() {
        warn!(model = %model, "Generation model returned no text");
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_model() {
        assert_eq!(GenAiConfig::default().model, DEFAULT_GENERATION_MODEL);
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(GenAiGenerator::new(GenAiConfig::new("  ")).is_err());
    }

    #[test]
    fn test_request_includes_system_prompt() {
        let generator =
            GenAiGenerator::new(GenAiConfig::new("gpt-4o-mini").with_system_prompt("be brief"))
                .unwrap();
        assert_eq!(generator.request("hi").messages.len(), 2);
        assert_eq!(generator.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_completion_text_is_trimmed() {
        assert_eq!(
            completion_text("m", Some("  Revenue grew.\n")),
            "Revenue grew."
        );
    }

    #[test]
    fn test_missing_or_blank_completion_is_empty_answer() {
        assert_eq!(completion_text("m", None), "");
        assert_eq!(completion_text("m", Some(" \n\t ")), "");
    }

    #[test]
    #[serial]
    fn test_from_env_model_override() {
        // SAFETY: Test code only, serialized via #[serial].
        unsafe { std::env::set_var(GenAiConfig::ENV_MODEL, "llama3.2:1b") };
        let config = GenAiConfig::from_env();
        // SAFETY: Test code only, serialized via #[serial].
        unsafe { std::env::remove_var(GenAiConfig::ENV_MODEL) };

        assert_eq!(config.model, "llama3.2:1b");
    }
}
