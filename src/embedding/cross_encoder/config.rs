use std::path::PathBuf;

/// Maximum tokens per (query, passage) pair.
pub const MAX_SEQ_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    /// Model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// `None` means no cross-encoder is installed.
    pub model_path: Option<PathBuf>,

    pub max_seq_len: usize,
}

impl Default for CrossEncoderConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: MAX_SEQ_LEN,
        }
    }
}

impl CrossEncoderConfig {
    pub const ENV_PATH: &'static str = "RAGLINE_CROSS_ENCODER_PATH";

    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Self::default()
        }
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.model_path.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_seq_len == 0 {
            return Err("max_seq_len must be > 0".to_string());
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }

    pub fn from_env() -> Self {
        let model_path = std::env::var(Self::ENV_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            model_path,
            max_seq_len: MAX_SEQ_LEN,
        }
    }
}
