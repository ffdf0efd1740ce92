use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation with model '{model}' failed: {message}")]
    RequestFailed { model: String, message: String },

    #[error("model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("invalid generation configuration: {reason}")]
    InvalidConfig { reason: String },
}
