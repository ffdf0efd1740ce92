use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::error::EmbeddingError;

#[derive(Debug, Error)]
pub enum CrossEncoderError {
    #[error("cross-encoder model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load cross-encoder model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("cross-encoder inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid cross-encoder configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("cross-encoder not configured")]
    NotConfigured,
}

impl From<candle_core::Error> for CrossEncoderError {
    fn from(err: candle_core::Error) -> Self {
        CrossEncoderError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CrossEncoderError {
    fn from(err: std::io::Error) -> Self {
        CrossEncoderError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for CrossEncoderError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DeviceUnavailable { device, reason } => {
                CrossEncoderError::DeviceUnavailable { device, reason }
            }
            EmbeddingError::ModelNotFound { path } => CrossEncoderError::ModelNotFound { path },
            _ => CrossEncoderError::InferenceFailed {
                reason: err.to_string(),
            },
        }
    }
}
