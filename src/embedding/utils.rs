use std::path::Path;

use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

/// Loads `tokenizer.json` from a model directory.
pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer, String> {
    let path = if model_dir.is_dir() {
        model_dir.join("tokenizer.json")
    } else {
        model_dir.to_path_buf()
    };

    if !path.exists() {
        return Err(format!("tokenizer not found at {}", path.display()));
    }

    Tokenizer::from_file(&path).map_err(|e| e.to_string())
}

/// Loads a tokenizer that truncates pair inputs to `max_len` tokens, trimming the
/// longer side first so the query survives.
pub fn load_tokenizer_with_truncation(model_dir: &Path, max_len: usize) -> Result<Tokenizer, String> {
    let mut tokenizer = load_tokenizer(model_dir)?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            strategy: TruncationStrategy::LongestFirst,
            ..Default::default()
        }))
        .map_err(|e| e.to_string())?;
    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokenizer_is_an_error() {
        let err = load_tokenizer(Path::new("/nonexistent/model")).unwrap_err();
        assert!(err.contains("tokenizer not found"));
    }
}
