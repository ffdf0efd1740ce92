use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that reach the caller. Every other collaborator problem degrades in place.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("document not found: {document_id}")]
    DocumentNotFound { document_id: String },

    #[error("answer generation failed for document '{document_id}': {details}")]
    GenerationFailed { document_id: String, details: String },
}

/// Serializable error shape for outer surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PipelineError {
    pub fn document_id(&self) -> &str {
        match self {
            PipelineError::DocumentNotFound { document_id }
            | PipelineError::GenerationFailed { document_id, .. } => document_id,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        match self {
            PipelineError::DocumentNotFound { document_id } => ErrorResponse {
                error: "Document not found".to_string(),
                document_id: document_id.clone(),
                details: None,
            },
            PipelineError::GenerationFailed {
                document_id,
                details,
            } => ErrorResponse {
                error: "Answer generation failed".to_string(),
                document_id: document_id.clone(),
                details: Some(details.clone()),
            },
        }
    }
}
