//! Query rewriting ahead of retrieval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::constants::DEFAULT_COLLABORATOR_TIMEOUT_MS;
use crate::generation::{GenerationError, GenerationParams, Generator, generate_within};

const REFINE_MAX_TOKENS: u32 = 96;

/// Rewrites a user query into a form that retrieves better.
#[async_trait]
pub trait QueryRefiner: Send + Sync {
    async fn refine(&self, query: &str) -> Result<String, GenerationError>;
}

/// Refiner that asks the generator for a single rewritten query.
pub struct GenerativeRefiner {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl std::fmt::Debug for GenerativeRefiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeRefiner")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenerativeRefiner {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn prompt(query: &str) -> String {
        format!(
            "Rewrite the following question so it works well as a search query over a single \
             document. Keep every entity, number and date. Reply with the rewritten query only, \
             on one line.\n\nQuestion: {query}\n\nRewritten query:"
        )
    }
}

/// First non-blank line of `raw`, without surrounding quotes.
pub fn clean_refinement(raw: &str) -> Option<String> {
    raw.lines()
        .map(|line| line.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl QueryRefiner for GenerativeRefiner {
    async fn refine(&self, query: &str) -> Result<String, GenerationError> {
        let params = GenerationParams::new(REFINE_MAX_TOKENS, 0.0);
        let raw = generate_within(
            self.generator.as_ref(),
            &Self::prompt(query),
            params,
            self.timeout,
        )
        .await?;

        let refined = clean_refinement(&raw).ok_or_else(|| GenerationError::EmptyResponse {
            model: "refiner".to_string(),
        })?;
        debug!(original = query, refined = %refined, "Refined query");
        Ok(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MockGenerator;

    #[test]
    fn test_clean_refinement() {
        assert_eq!(
            clean_refinement("\n  \"revenue 2021\"  \nextra"),
            Some("revenue 2021".to_string())
        );
        assert_eq!(clean_refinement("  \n \"\" "), None);
    }

    #[tokio::test]
    async fn test_generative_refiner_uses_first_line() {
        let generator = Arc::new(MockGenerator::new("total revenue 2021\nbecause..."));
        let refiner = GenerativeRefiner::new(generator.clone());

        let refined = refiner.refine("how much money in 2021?").await.unwrap();
        assert_eq!(refined, "total revenue 2021");
        assert!(generator.prompts()[0].contains("how much money in 2021?"));
    }

    #[tokio::test]
    async fn test_generative_refiner_rejects_blank_reply() {
        let refiner = GenerativeRefiner::new(Arc::new(MockGenerator::new("   ")));
        assert!(matches!(
            refiner.refine("q").await,
            Err(GenerationError::EmptyResponse { .. })
        ));
    }
}
