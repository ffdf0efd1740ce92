use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{GenerationError, GenerationParams, Generator};

/// Scripted generator: pops queued responses in order, then repeats the default.
/// Every prompt it receives is recorded.
#[derive(Debug, Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    default_response: Option<String>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockGenerator {
    /// Always answers `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: Some(response.into()),
            ..Self::default()
        }
    }

    /// Answers each entry once, in order; afterwards every call fails.
    pub fn scripted<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, GenerationError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, response: Result<String, GenerationError>) {
        self.script.lock().push_back(response);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn failure(message: &str) -> GenerationError {
        GenerationError::RequestFailed {
            model: "mock".to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _params: GenerationParams,
    ) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(response) => response,
            None => self
                .default_response
                .clone()
                .ok_or_else(|| Self::failure("mock generator has no response left")),
        }
    }
}
