//! Reliability judging for generated answers.
//!
//! Scores live on `[0, 1]`. Callers holding 0–100 confidence values convert with
//! [`from_percent`] / [`to_percent`] at their boundary.
//!
//! The base score is a cheap lexical heuristic: the fraction of context candidates that
//! share at least one token with the query. When a judge model is configured it is asked
//! a yes/no "is this answer supported?" question; a yes raises the score to at least
//! [`JudgeConfig::supported_floor`], a no caps it at [`JudgeConfig::unsupported_cap`].

pub mod config;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::JudgeConfig;
#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedJudge;
pub use types::{JudgeMethod, JudgeVerdict, clamp_score};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::generation::{GenerationError, GenerationParams, Generator, generate_within};
use crate::parsing::last_structured_as;
use crate::text::{shares_token, token_set, truncate_chars};
use crate::types::RankedCandidate;

/// Answer-judging seam used by the pipeline.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Never fails: backend problems fall back to the heuristic.
    async fn judge(
        &self,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> JudgeVerdict;
}

/// `percent / 100`, clamped into `[0, 1]`.
pub fn from_percent(percent: f32) -> f32 {
    clamp_score(percent / 100.0)
}

/// `score * 100`, rounded, for 0–100 displays.
pub fn to_percent(score: f32) -> u8 {
    (clamp_score(score) * 100.0).round() as u8
}

/// Accepts a threshold on either scale: values above `1.0` are read as percentages.
pub fn normalize_threshold(threshold: f32) -> f32 {
    if threshold > 1.0 {
        from_percent(threshold)
    } else {
        clamp_score(threshold)
    }
}

/// `(matching, total)` candidates sharing a token with `query`.
pub fn overlap_counts(query: &str, candidates: &[RankedCandidate]) -> (usize, usize) {
    let query_tokens = token_set(query);
    let matching = candidates
        .iter()
        .filter(|c| shares_token(&query_tokens, c.text()))
        .count();
    (matching, candidates.len())
}

/// `matching / total`; `0.0` without candidates.
pub fn overlap_fraction(query: &str, candidates: &[RankedCandidate]) -> f32 {
    match overlap_counts(query, candidates) {
        (_, 0) => 0.0,
        (matching, total) => matching as f32 / total as f32,
    }
}

#[derive(Debug, Deserialize)]
struct SupportReply {
    supported: bool,
    #[serde(default)]
    reason: String,
}

pub struct AnswerJudge {
    generator: Option<Arc<dyn Generator>>,
    config: JudgeConfig,
}

impl std::fmt::Debug for AnswerJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerJudge")
            .field("corroborates", &self.generator.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AnswerJudge {
    /// Heuristic-only judge.
    pub fn heuristic(config: JudgeConfig) -> Self {
        Self {
            generator: None,
            config,
        }
    }

    /// Judge that corroborates the heuristic with `generator`.
    pub fn with_model(generator: Arc<dyn Generator>, config: JudgeConfig) -> Self {
        Self {
            generator: Some(generator),
            config,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    fn corroboration_prompt(
        &self,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> String {
        let snippets: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let page = c
                    .page()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let snip = truncate_chars(c.text(), self.config.snippet_chars).replace('\n', " ");
                format!("[{}] page={} text_snip=\"{}\"", i + 1, page, snip)
            })
            .collect();

        format!(
            "You are checking whether an answer is supported by the given context.\n\
             Question:\n\"\"\"{query}\"\"\"\n\n\
             Answer:\n\"\"\"{answer}\"\"\"\n\n\
             Context snippets:\n{}\n\n\
             Reply with ONLY valid JSON like: {{\"supported\": true, \"reason\": \"short reason\"}}",
            snippets.join("\n")
        )
    }

    async fn corroborate(
        &self,
        generator: &dyn Generator,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> Result<SupportReply, GenerationError> {
        let prompt = self.corroboration_prompt(query, answer, candidates);
        let params = GenerationParams::new(self.config.max_tokens, 0.0);
        let raw = generate_within(generator, &prompt, params, self.config.timeout).await?;

        last_structured_as::<SupportReply>(&raw).ok_or_else(|| GenerationError::RequestFailed {
            model: "judge".to_string(),
            message: format!(
                "no {{\"supported\": ...}} object in reply ({} chars)",
                raw.len()
            ),
        })
    }
}

#[async_trait]
impl Judge for AnswerJudge {
    async fn judge(
        &self,
        query: &str,
        answer: &str,
        candidates: &[RankedCandidate],
    ) -> JudgeVerdict {
        if answer.trim().is_empty() {
            debug!("Empty answer, skipping judge");
            return JudgeVerdict::no_answer();
        }

        let (matching, total) = overlap_counts(query, candidates);
        let overlap = if total == 0 {
            0.0
        } else {
            matching as f32 / total as f32
        };
        let heuristic = format!("heuristic overlap {}/{} ({:.2})", matching, total, overlap);

        let verdict = match &self.generator {
            None => JudgeVerdict::new(
                overlap,
                format!("{heuristic}; corroboration not run"),
                overlap,
                JudgeMethod::Heuristic,
            ),
            Some(generator) => match self
                .corroborate(generator.as_ref(), query, answer, candidates)
                .await
            {
                Ok(reply) => {
                    let score = if reply.supported {
                        overlap.max(self.config.supported_floor)
                    } else {
                        overlap.min(self.config.unsupported_cap)
                    };
                    let status = if reply.supported {
                        "supported"
                    } else {
                        "unsupported"
                    };
                    let reason = if reply.reason.trim().is_empty() {
                        format!("{heuristic}; judge model: {status}")
                    } else {
                        format!("{heuristic}; judge model: {status} ({})", reply.reason.trim())
                    };
                    JudgeVerdict::new(
                        score,
                        reason,
                        overlap,
                        JudgeMethod::Corroborated {
                            supported: reply.supported,
                        },
                    )
                }
                Err(e) => {
                    warn!(error = %e, "Judge model corroboration failed, using heuristic");
                    JudgeVerdict::new(
                        overlap,
                        format!("{heuristic}; corroboration failed"),
                        overlap,
                        JudgeMethod::CorroborationFailed,
                    )
                }
            },
        };

        info!(
            score = verdict.score,
            overlap,
            method = %verdict.method,
            "Judged answer"
        );
        verdict
    }
}
