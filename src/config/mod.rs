//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `RAGLINE_*` environment variables, then
//! derive the per-component configs with the `*_config` methods.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLABORATOR_TIMEOUT_MS, DEFAULT_DENSE_WEIGHT, DEFAULT_DIVERSITY_PENALTY,
    DEFAULT_JUDGE_THRESHOLD, DEFAULT_MAX_ANSWER_CHARS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_CONTEXT_TOKENS,
};
use crate::embedding::CrossEncoderConfig;
use crate::embedding::HttpEmbedderConfig;
use crate::embedding::http::DEFAULT_EMBEDDING_MODEL;
use crate::generation::{DEFAULT_GENERATION_MODEL, GenAiConfig};
use crate::judge::{JudgeConfig, normalize_threshold};
use crate::pipeline::{PipelineConfig, PipelineRequest};
use crate::rerank::RerankConfig;
use crate::retrieval::{DEFAULT_COLLECTION_NAME, FusionConfig, RetrievalConfig};

/// Default Qdrant URL used when `RAGLINE_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Crate configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RAGLINE_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Dense share of the fused score. Default: `0.3`.
    pub dense_weight: f32,

    /// Per-repeat page penalty. Default: `0.12`.
    pub diversity_penalty: f32,

    /// Default judge threshold on `[0, 1]`. Default: `0.7`.
    pub judge_threshold: f32,

    /// Default retry cap. Default: `2`.
    pub max_attempts: u32,

    pub max_context_tokens: usize,
    pub max_answer_chars: usize,

    /// Bound for every collaborator call. Default: 30s.
    pub collaborator_timeout: Duration,

    /// Append the "Answer Confidence" footer. Default: `false`.
    pub append_confidence: bool,

    /// Cross-encoder model directory; unset disables that rerank tier.
    pub cross_encoder_path: Option<PathBuf>,

    /// Embedding service base URL; unset disables dense retrieval embedding and the
    /// embedding rerank tier.
    pub embedding_url: Option<String>,
    pub embedding_model: String,

    pub generation_model: String,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,
    pub qdrant_collection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dense_weight: DEFAULT_DENSE_WEIGHT,
            diversity_penalty: DEFAULT_DIVERSITY_PENALTY,
            judge_threshold: DEFAULT_JUDGE_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            collaborator_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            append_confidence: false,
            cross_encoder_path: None,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            qdrant_collection: DEFAULT_COLLECTION_NAME.to_string(),
        }
    }
}

impl Config {
    const ENV_DENSE_WEIGHT: &'static str = "RAGLINE_DENSE_WEIGHT";
    const ENV_DIVERSITY_PENALTY: &'static str = "RAGLINE_DIVERSITY_PENALTY";
    const ENV_JUDGE_THRESHOLD: &'static str = "RAGLINE_JUDGE_THRESHOLD";
    const ENV_MAX_ATTEMPTS: &'static str = "RAGLINE_MAX_ATTEMPTS";
    const ENV_MAX_CONTEXT_TOKENS: &'static str = "RAGLINE_MAX_CONTEXT_TOKENS";
    const ENV_MAX_ANSWER_CHARS: &'static str = "RAGLINE_MAX_ANSWER_CHARS";
    const ENV_TIMEOUT_MS: &'static str = "RAGLINE_COLLABORATOR_TIMEOUT_MS";
    const ENV_APPEND_CONFIDENCE: &'static str = "RAGLINE_APPEND_CONFIDENCE";
    const ENV_QDRANT_URL: &'static str = "RAGLINE_QDRANT_URL";
    const ENV_QDRANT_COLLECTION: &'static str = "RAGLINE_QDRANT_COLLECTION";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Values that fail to parse are errors; range checks are left to [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeout_ms = Self::parse_from_env(
            Self::ENV_TIMEOUT_MS,
            defaults.collaborator_timeout.as_millis() as u64,
        )?;

        Ok(Self {
            dense_weight: Self::parse_from_env(Self::ENV_DENSE_WEIGHT, defaults.dense_weight)?,
            diversity_penalty: Self::parse_from_env(
                Self::ENV_DIVERSITY_PENALTY,
                defaults.diversity_penalty,
            )?,
            judge_threshold: normalize_threshold(Self::parse_from_env(
                Self::ENV_JUDGE_THRESHOLD,
                defaults.judge_threshold,
            )?),
            max_attempts: Self::parse_from_env(Self::ENV_MAX_ATTEMPTS, defaults.max_attempts)?,
            max_context_tokens: Self::parse_from_env(
                Self::ENV_MAX_CONTEXT_TOKENS,
                defaults.max_context_tokens,
            )?,
            max_answer_chars: Self::parse_from_env(
                Self::ENV_MAX_ANSWER_CHARS,
                defaults.max_answer_chars,
            )?,
            collaborator_timeout: Duration::from_millis(timeout_ms),
            append_confidence: Self::parse_bool_from_env(
                Self::ENV_APPEND_CONFIDENCE,
                defaults.append_confidence,
            )?,
            cross_encoder_path: Self::parse_optional_from_env(CrossEncoderConfig::ENV_PATH)
                .map(PathBuf::from),
            embedding_url: Self::parse_optional_from_env(HttpEmbedderConfig::ENV_URL),
            embedding_model: Self::parse_optional_from_env(HttpEmbedderConfig::ENV_MODEL)
                .unwrap_or(defaults.embedding_model),
            generation_model: Self::parse_optional_from_env(GenAiConfig::ENV_MODEL)
                .unwrap_or(defaults.generation_model),
            qdrant_url: Self::parse_optional_from_env(Self::ENV_QDRANT_URL)
                .unwrap_or(defaults.qdrant_url),
            qdrant_collection: Self::parse_optional_from_env(Self::ENV_QDRANT_COLLECTION)
                .unwrap_or(defaults.qdrant_collection),
        })
    }

    /// Checks ranges, URLs and the cross-encoder directory (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_unit("dense_weight", self.dense_weight)?;
        Self::check_unit("judge_threshold", self.judge_threshold)?;

        if !self.diversity_penalty.is_finite() || self.diversity_penalty < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "diversity_penalty",
                reason: format!("must be >= 0.0, got {}", self.diversity_penalty),
            });
        }
        for (name, value) in [
            ("max_context_tokens", self.max_context_tokens),
            ("max_answer_chars", self.max_answer_chars),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        if self.collaborator_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "collaborator_timeout",
                reason: "must be > 0".to_string(),
            });
        }

        Self::check_url("qdrant_url", &self.qdrant_url)?;
        if let Some(url) = &self.embedding_url {
            Self::check_url("embedding_url", url)?;
        }

        if let Some(ref path) = self.cross_encoder_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig::default().with_dense_weight(self.dense_weight)
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig::default()
            .with_fusion(self.fusion_config())
            .with_diversity_penalty(self.diversity_penalty)
            .with_timeout(self.collaborator_timeout)
    }

    pub fn rerank_config(&self) -> RerankConfig {
        RerankConfig::default().with_timeout(self.collaborator_timeout)
    }

    pub fn judge_config(&self) -> JudgeConfig {
        JudgeConfig::default().with_timeout(self.collaborator_timeout)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_max_context_tokens(self.max_context_tokens)
            .with_max_answer_chars(self.max_answer_chars)
            .with_timeout(self.collaborator_timeout)
            .with_append_confidence(self.append_confidence)
    }

    /// A request for `query` against `document_id` carrying the configured judge threshold
    /// and retry cap.
    pub fn request(
        &self,
        document_id: impl Into<String>,
        query: impl Into<String>,
    ) -> PipelineRequest {
        PipelineRequest::new(document_id, query)
            .with_judge_threshold(self.judge_threshold)
            .with_max_attempts(self.max_attempts)
    }

    pub fn cross_encoder_config(&self) -> CrossEncoderConfig {
        match &self.cross_encoder_path {
            Some(path) => CrossEncoderConfig::new(path.clone()),
            None => CrossEncoderConfig::default(),
        }
    }

    /// `None` when no embedding service is configured.
    pub fn embedding_config(&self) -> Option<HttpEmbedderConfig> {
        self.embedding_url.as_ref().map(|url| {
            HttpEmbedderConfig::new(url.clone())
                .with_model(self.embedding_model.clone())
                .with_timeout(self.collaborator_timeout)
        })
    }

    pub fn generation_config(&self) -> GenAiConfig {
        GenAiConfig::new(self.generation_model.clone())
    }

    fn check_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::OutOfRange {
                name,
                reason: format!("must be between 0.0 and 1.0, got {}", value),
            });
        }
        Ok(())
    }

    fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
            })
        }
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::parse_optional_from_env(name) {
            Some(value) => match value.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => Err(ConfigError::ParseError {
                    name,
                    reason: e.to_string(),
                    value,
                }),
            },
            None => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match Self::parse_optional_from_env(name) {
            Some(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::ParseError {
                    name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            None => Ok(default),
        }
    }

    fn parse_optional_from_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
