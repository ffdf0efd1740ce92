use thiserror::Error;

use crate::embedding::EmbeddingError;

pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Errors returned by retrieval backends.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to connect to {backend} at '{url}': {message}")]
    ConnectionFailed {
        backend: &'static str,
        url: String,
        message: String,
    },

    #[error("{backend} search failed: {message}")]
    SearchFailed {
        backend: &'static str,
        message: String,
    },

    #[error("lexical index operation failed: {reason}")]
    IndexFailed { reason: String },

    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl From<tantivy::TantivyError> for RetrievalError {
    fn from(err: tantivy::TantivyError) -> Self {
        RetrievalError::IndexFailed {
            reason: err.to_string(),
        }
    }
}
