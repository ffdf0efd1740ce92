use super::*;
use serial_test::serial;

#[test]
fn test_default_config_is_unconfigured() {
    let config = CrossEncoderConfig::default();
    assert!(!config.is_configured());
    assert_eq!(config.max_seq_len, MAX_SEQ_LEN);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_empty_path() {
    let config = CrossEncoderConfig::new("");
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_seq_len() {
    let config = CrossEncoderConfig::new("/models/ce").with_max_seq_len(0);
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_from_env_reads_path() {
    // SAFETY: Test code only, serialized via #[serial].
    unsafe { std::env::set_var(CrossEncoderConfig::ENV_PATH, "  /models/ms-marco  ") };
    let config = CrossEncoderConfig::from_env();
    unsafe { std::env::remove_var(CrossEncoderConfig::ENV_PATH) };

    assert_eq!(
        config.model_path.as_deref(),
        Some(std::path::Path::new("/models/ms-marco"))
    );
}

#[test]
#[serial]
fn test_from_env_blank_path_is_unconfigured() {
    // SAFETY: Test code only, serialized via #[serial].
    unsafe { std::env::set_var(CrossEncoderConfig::ENV_PATH, "   ") };
    let config = CrossEncoderConfig::from_env();
    unsafe { std::env::remove_var(CrossEncoderConfig::ENV_PATH) };

    assert!(config.model_path.is_none());
}

#[test]
fn test_load_without_path_is_not_configured() {
    let err = BertCrossEncoder::load(CrossEncoderConfig::default()).unwrap_err();
    assert!(matches!(err, CrossEncoderError::NotConfigured));
}

#[test]
fn test_load_missing_directory() {
    let err = BertCrossEncoder::load(CrossEncoderConfig::new("/nonexistent/ce")).unwrap_err();
    assert!(matches!(err, CrossEncoderError::ModelNotFound { .. }));
}

#[test]
fn test_try_load_degrades_to_none() {
    assert!(BertCrossEncoder::try_load(CrossEncoderConfig::default()).is_none());
    assert!(BertCrossEncoder::try_load(CrossEncoderConfig::new("/nonexistent/ce")).is_none());
}

#[test]
fn test_default_score_batch_preserves_order() {
    struct LengthEncoder;
    impl CrossEncoder for LengthEncoder {
        fn score(&self, _query: &str, passage: &str) -> Result<f32, CrossEncoderError> {
            Ok(passage.len() as f32)
        }
    }

    let scores = LengthEncoder.score_batch("q", &["a", "abc", "ab"]).unwrap();
    assert_eq!(scores, vec![1.0, 3.0, 2.0]);
}
