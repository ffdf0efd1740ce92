//! Cross-encoder text-pair comparator.
//!
//! Scores how well a passage answers a query by running both through one encoder. Raw
//! outputs are unbounded logits; [`crate::rerank`] squashes them into `[0, 1]`.

pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::{CrossEncoderConfig, MAX_SEQ_LEN};
pub use error::CrossEncoderError;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::{BertClassifier, missing_model_file};
use crate::embedding::device::{device_label, select_device};
use crate::embedding::utils::load_tokenizer_with_truncation;

/// Text-pair comparator collaborator. Blocking; callers run it off the async executor.
pub trait CrossEncoder: Send + Sync {
    /// Raw relevance score for one pair; higher is more relevant.
    fn score(&self, query: &str, passage: &str) -> Result<f32, CrossEncoderError>;

    /// Scores every passage against `query`, preserving order.
    fn score_batch(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, CrossEncoderError> {
        passages.iter().map(|p| self.score(query, p)).collect()
    }
}

/// BERT-family cross-encoder run locally with candle.
pub struct BertCrossEncoder {
    device: Device,
    config: CrossEncoderConfig,
    model: BertClassifier,
    tokenizer: Tokenizer,
}

impl std::fmt::Debug for BertCrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertCrossEncoder")
            .field("device", &device_label(&self.device))
            .field("config", &self.config)
            .finish()
    }
}

impl BertCrossEncoder {
    pub fn load(config: CrossEncoderConfig) -> Result<Self, CrossEncoderError> {
        if let Err(msg) = config.validate() {
            return Err(CrossEncoderError::InvalidConfig { reason: msg });
        }

        let model_path = config
            .model_path
            .clone()
            .ok_or(CrossEncoderError::NotConfigured)?;

        if !model_path.exists() {
            return Err(CrossEncoderError::ModelNotFound { path: model_path });
        }
        if let Some(missing) = missing_model_file(&model_path) {
            return Err(CrossEncoderError::ModelLoadFailed {
                reason: format!("Missing {}", missing.display()),
            });
        }

        let device = select_device()?;
        info!(
            model_path = %model_path.display(),
            device = device_label(&device),
            "Loading cross-encoder model"
        );

        let model = BertClassifier::load(&model_path, &device).map_err(|e| {
            CrossEncoderError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;

        let tokenizer = load_tokenizer_with_truncation(&model_path, config.max_seq_len)
            .map_err(|e| CrossEncoderError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        info!("Cross-encoder model loaded");

        Ok(Self {
            device,
            config,
            model,
            tokenizer,
        })
    }

    /// Loads the model if one is configured; logs and returns `None` otherwise.
    pub fn try_load(config: CrossEncoderConfig) -> Option<Self> {
        if !config.is_configured() {
            debug!("No cross-encoder configured");
            return None;
        }

        match Self::load(config) {
            Ok(encoder) => Some(encoder),
            Err(e) => {
                warn!(error = %e, "Cross-encoder unavailable, reranking will use fallback tiers");
                None
            }
        }
    }

    pub fn config(&self) -> &CrossEncoderConfig {
        &self.config
    }

    fn row_tensor(&self, values: &[u32]) -> Result<Tensor, CrossEncoderError> {
        Ok(Tensor::new(values, &self.device)?.unsqueeze(0)?)
    }
}

impl CrossEncoder for BertCrossEncoder {
    fn score(&self, query: &str, passage: &str) -> Result<f32, CrossEncoderError> {
        let encoding = self.tokenizer.encode((query, passage), true).map_err(|e| {
            CrossEncoderError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let input_ids = self.row_tensor(encoding.get_ids())?;
        let type_ids = self.row_tensor(encoding.get_type_ids())?;
        let attention_mask = self.row_tensor(encoding.get_attention_mask())?;

        let logits = self
            .model
            .forward(&input_ids, &type_ids, Some(&attention_mask))?
            .flatten_all()?
            .to_vec1::<f32>()?;

        let score = logits
            .first()
            .copied()
            .ok_or_else(|| CrossEncoderError::InferenceFailed {
                reason: "model returned no logits".to_string(),
            })?;

        debug!(
            query_len = query.len(),
            passage_len = passage.len(),
            score,
            "Scored pair"
        );
        Ok(score)
    }
}
