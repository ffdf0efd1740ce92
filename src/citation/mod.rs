//! Opt-in source attribution for final answers.
//!
//! Only queries that ask for it (mentioning "cite" or "source") get a citation block.
//! The generator is asked which chunks support the answer; when it gives nothing usable,
//! chunks lexically overlapping the query are listed instead, and when even that is empty
//! an explicit "None identified" line is appended.


use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{CITATION_MAX_TOKENS, DEFAULT_COLLABORATOR_TIMEOUT_MS, DEFAULT_SNIPPET_CHARS};
use crate::generation::{GenerationError, GenerationParams, Generator, generate_within};
use crate::parsing::last_structured_as;
use crate::text::{shares_token, token_set, truncate_chars};
use crate::types::RankedCandidate;

const REQUEST_KEYWORDS: [&str; 2] = ["cite", "source"];

pub const NO_SOURCES_NOTICE: &str = "\n\n---\nSources: None identified.";

/// How the citation block was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationMethod {
    /// The query did not ask for sources; answer unchanged.
    NotRequested,
    Model,
    Heuristic,
    NoneIdentified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitedAnswer {
    pub text: String,
    pub method: CitationMethod,
}

#[derive(Debug, Deserialize)]
struct CitationReply {
    citations: Vec<CitedSource>,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct CitedSource {
    #[serde(default)]
    chunk_id: Value,
    #[serde(default)]
    page: Value,
}

/// Renders a loosely-typed id or page; missing values show as `?`.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "?".to_string(),
        Value::String(s) if s.trim().is_empty() => "?".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_page(page: Option<u32>) -> String {
    page.map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// `true` when the query asks for sources (case-insensitive).
pub fn is_requested(query: &str) -> bool {
    let lower = query.to_lowercase();
    REQUEST_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub struct SourceCiter {
    generator: Option<Arc<dyn Generator>>,
    timeout: Duration,
}

impl std::fmt::Debug for SourceCiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCiter")
            .field("model", &self.generator.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SourceCiter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator: Some(generator),
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }

    /// Citer that only uses the lexical fallback.
    pub fn heuristic() -> Self {
        Self {
            generator: None,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn cite(
        &self,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> CitedAnswer {
        if !is_requested(query) {
            return CitedAnswer {
                text: answer.to_string(),
                method: CitationMethod::NotRequested,
            };
        }

        if let Some(generator) = &self.generator {
            match self
                .ask_model(generator.as_ref(), query, answer, candidates)
                .await
            {
                Ok(Some(block)) => {
                    debug!("Attached model citations");
                    return CitedAnswer {
                        text: format!("{answer}{block}"),
                        method: CitationMethod::Model,
                    };
                }
                Ok(None) => debug!("Model returned no usable citations, using heuristic"),
                Err(e) => warn!(error = %e, "Citation model failed, using heuristic"),
            }
        }

        match heuristic_block(query, candidates) {
            Some(block) => CitedAnswer {
                text: format!("{answer}{block}"),
                method: CitationMethod::Heuristic,
            },
            None => CitedAnswer {
                text: format!("{answer}{NO_SOURCES_NOTICE}"),
                method: CitationMethod::NoneIdentified,
            },
        }
    }

    async fn ask_model(
        &self,
        generator: &dyn Generator,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> Result<Option<String>, GenerationError> {
        let prompt = citation_prompt(query, answer, candidates);
        let params = GenerationParams::new(CITATION_MAX_TOKENS, 0.0);
        let raw = generate_within(generator, &prompt, params, self.timeout).await?;

        let Some(reply) = last_structured_as::<CitationReply>(&raw) else {
            return Ok(None);
        };
        if reply.citations.is_empty() {
            return Ok(None);
        }

        let mut block = String::from("\n\n---\nSources:\n");
        for source in &reply.citations {
            let _ = writeln!(
                block,
                "- Chunk {} (Page {})",
                display_value(&source.chunk_id),
                display_value(&source.page)
            );
        }
        let _ = write!(block, "\nReason: {}", reply.reason.trim());
        Ok(Some(block))
    }
}

fn citation_prompt(query: &str, answer: &str, candidates: &[RankedCandidate]) -> String {
    let sources: Vec<String> = candidates
        .iter()
        .map(|c| {
            format!(
                "[Chunk {}] (Page {}) {}",
                c.chunk.id(),
                display_page(c.page()),
                truncate_chars(c.text(), DEFAULT_SNIPPET_CHARS)
            )
        })
        .collect();

    format!(
        "The user asked: \"{query}\"\n\
         The assistant answered: \"{answer}\"\n\n\
         Here are the available source chunks with IDs and page numbers:\n{}\n\n\
         Task:\n\
         - Identify which chunks support each part of the answer.\n\
         - Respond ONLY in JSON with keys \"citations\" (list of objects with \"chunk_id\" and \"page\") and \"reason\".\n\n\
         Example:\n\
         {{\"citations\": [{{\"chunk_id\": \"2\", \"page\": 5}}], \"reason\": \"The answer is based on chunk 2.\"}}",
        sources.join("\n\n")
    )
}

fn heuristic_block(query: &str, candidates: &[RankedCandidate]) -> Option<String> {
    let query_tokens = token_set(query);
    let mut block = String::new();

    for candidate in candidates
        .iter()
        .filter(|c| shares_token(&query_tokens, c.text()))
    {
        let _ = writeln!(
            block,
            "- Chunk {} (Page {})",
            candidate.chunk.id(),
            display_page(candidate.page())
        );
    }

    (!block.is_empty()).then(|| format!("\n\n---\nSources (heuristic):\n{block}"))
}
