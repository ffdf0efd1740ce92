use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::documents::{DocumentMetadata, InMemoryDocumentStore};
use crate::generation::MockGenerator;
use crate::judge::ScriptedJudge;
use crate::pipeline::Pipeline;
use crate::retrieval::{HybridRetriever, MockRetriever};
use crate::types::{Chunk, ChunkMetadata, RetrievalHit};

const ALL_VARS: &[&str] = &[
    "RAGLINE_DENSE_WEIGHT",
    "RAGLINE_DIVERSITY_PENALTY",
    "RAGLINE_JUDGE_THRESHOLD",
    "RAGLINE_MAX_ATTEMPTS",
    "RAGLINE_MAX_CONTEXT_TOKENS",
    "RAGLINE_MAX_ANSWER_CHARS",
    "RAGLINE_COLLABORATOR_TIMEOUT_MS",
    "RAGLINE_APPEND_CONFIDENCE",
    "RAGLINE_CROSS_ENCODER_PATH",
    "RAGLINE_EMBEDDING_URL",
    "RAGLINE_EMBEDDING_MODEL",
    "RAGLINE_GENERATION_MODEL",
    "RAGLINE_QDRANT_URL",
    "RAGLINE_QDRANT_COLLECTION",
];

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_ragline_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.dense_weight, 0.3);
    assert_eq!(config.diversity_penalty, 0.12);
    assert_eq!(config.judge_threshold, 0.7);
    assert_eq!(config.max_attempts, 2);
    assert_eq!(config.max_context_tokens, 1200);
    assert_eq!(config.max_answer_chars, 3000);
    assert_eq!(config.collaborator_timeout, Duration::from_millis(30_000));
    assert!(!config.append_confidence);
    assert!(config.cross_encoder_path.is_none());
    assert!(config.embedding_url.is_none());
    assert_eq!(config.embedding_model, "nomic-embed-text");
    assert_eq!(config.generation_model, "qwen2.5:3b");
    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.qdrant_collection, "ragline_chunks");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_ragline_env();

    let config = Config::from_env().expect("should parse with defaults");
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_full_config_parse() {
    clear_ragline_env();

    with_env_vars(
        &[
            ("RAGLINE_DENSE_WEIGHT", "0.5"),
            ("RAGLINE_DIVERSITY_PENALTY", "0.2"),
            ("RAGLINE_JUDGE_THRESHOLD", "0.8"),
            ("RAGLINE_MAX_ATTEMPTS", "4"),
            ("RAGLINE_MAX_CONTEXT_TOKENS", "2000"),
            ("RAGLINE_MAX_ANSWER_CHARS", "500"),
            ("RAGLINE_COLLABORATOR_TIMEOUT_MS", "1500"),
            ("RAGLINE_APPEND_CONFIDENCE", "true"),
            ("RAGLINE_CROSS_ENCODER_PATH", "/models/ms-marco-minilm"),
            ("RAGLINE_EMBEDDING_URL", "http://embed.local:11434"),
            ("RAGLINE_EMBEDDING_MODEL", "bge-small"),
            ("RAGLINE_GENERATION_MODEL", "llama3.2"),
            ("RAGLINE_QDRANT_URL", "http://qdrant.cluster:6334"),
            ("RAGLINE_QDRANT_COLLECTION", "reports"),
        ],
        || {
            let config = Config::from_env().expect("should parse full config");

            assert_eq!(config.dense_weight, 0.5);
            assert_eq!(config.diversity_penalty, 0.2);
            assert_eq!(config.judge_threshold, 0.8);
            assert_eq!(config.max_attempts, 4);
            assert_eq!(config.max_context_tokens, 2000);
            assert_eq!(config.max_answer_chars, 500);
            assert_eq!(config.collaborator_timeout, Duration::from_millis(1500));
            assert!(config.append_confidence);
            assert_eq!(
                config.cross_encoder_path,
                Some(PathBuf::from("/models/ms-marco-minilm"))
            );
            assert_eq!(
                config.embedding_url.as_deref(),
                Some("http://embed.local:11434")
            );
            assert_eq!(config.embedding_model, "bge-small");
            assert_eq!(config.generation_model, "llama3.2");
            assert_eq!(config.qdrant_url, "http://qdrant.cluster:6334");
            assert_eq!(config.qdrant_collection, "reports");
        },
    );
}

#[test]
fn test_request_carries_judge_settings() {
    let config = Config {
        judge_threshold: 0.55,
        max_attempts: 5,
        ..Default::default()
    };

    let request = config.request("annual", "What grew?");
    assert_eq!(request.document_id, "annual");
    assert_eq!(request.query, "What grew?");
    assert_eq!(request.judge_threshold, 0.55);
    assert_eq!(request.max_attempts, 5);
}

fn pipeline_with_judge(config: &Config, judge: Arc<ScriptedJudge>) -> Pipeline {
    let documents = InMemoryDocumentStore::new();
    documents.save(DocumentMetadata::new("annual"));

    let hits = vec![RetrievalHit::dense(
        Chunk::new("annual_page1_c0", "Revenue grew 12%", ChunkMetadata::new("annual")),
        0.9,
    )];
    let retriever = HybridRetriever::new(
        Arc::new(MockRetriever::new(hits)),
        Arc::new(MockRetriever::empty()),
        config.retrieval_config(),
    );

    Pipeline::builder(
        Arc::new(documents),
        retriever,
        Arc::new(MockGenerator::new("Revenue grew 12%.")),
    )
    .judge(judge)
    .config(config.pipeline_config())
    .build()
}

#[tokio::test]
#[serial]
async fn test_env_retry_settings_drive_the_run() {
    clear_ragline_env();

    let config = with_env_vars(
        &[
            ("RAGLINE_MAX_ATTEMPTS", "0"),
            ("RAGLINE_JUDGE_THRESHOLD", "0.9"),
        ],
        || Config::from_env().unwrap(),
    );
    let judge = Arc::new(ScriptedJudge::new([0.5]));
    let pipeline = pipeline_with_judge(&config, judge.clone());

    let result = pipeline
        .run(config.request("annual", "How did revenue change?"))
        .await
        .unwrap();

    assert_eq!(result.attempts, 0);
    assert_eq!(result.attempt_records.len(), 1);
    assert_eq!(judge.call_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_env_threshold_accepts_low_scores() {
    clear_ragline_env();

    let config = with_env_vars(
        &[
            ("RAGLINE_MAX_ATTEMPTS", "3"),
            ("RAGLINE_JUDGE_THRESHOLD", "0.4"),
        ],
        || Config::from_env().unwrap(),
    );
    let judge = Arc::new(ScriptedJudge::new([0.5]));
    let pipeline = pipeline_with_judge(&config, judge.clone());

    let result = pipeline
        .run(config.request("annual", "How did revenue change?"))
        .await
        .unwrap();

    assert_eq!(result.attempts, 0);
    assert_eq!(judge.call_count(), 1);

    let strict = Config {
        judge_threshold: 0.9,
        ..config
    };
    let judge = Arc::new(ScriptedJudge::new([0.5]));
    let result = pipeline_with_judge(&strict, judge.clone())
        .run(strict.request("annual", "How did revenue change?"))
        .await
        .unwrap();

    assert_eq!(result.attempts, 3);
    assert_eq!(judge.call_count(), 4);
}

#[test]
#[serial]
fn test_percent_threshold_is_normalized() {
    clear_ragline_env();

    with_env_vars(&[("RAGLINE_JUDGE_THRESHOLD", "75")], || {
        let config = Config::from_env().unwrap();
        assert!((config.judge_threshold - 0.75).abs() < 1e-6);
    });
}

#[test]
#[serial]
fn test_blank_values_use_defaults() {
    clear_ragline_env();

    with_env_vars(
        &[
            ("RAGLINE_DENSE_WEIGHT", "   "),
            ("RAGLINE_EMBEDDING_URL", ""),
        ],
        || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.dense_weight, 0.3);
            assert!(config.embedding_url.is_none());
        },
    );
}

#[test]
#[serial]
fn test_unparseable_number_is_an_error() {
    clear_ragline_env();

    with_env_vars(&[("RAGLINE_MAX_ATTEMPTS", "many")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ParseError {
                name: "RAGLINE_MAX_ATTEMPTS",
                ..
            }
        ));
        assert!(err.to_string().contains("RAGLINE_MAX_ATTEMPTS='many'"));
    });
}

#[test]
#[serial]
fn test_unparseable_bool_is_an_error() {
    clear_ragline_env();

    with_env_vars(&[("RAGLINE_APPEND_CONFIDENCE", "maybe")], || {
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::ParseError { .. })
        ));
    });
}

#[test]
fn test_validate_success_with_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_rejects_out_of_range_weight() {
    let config = Config {
        dense_weight: 1.5,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfRange {
            name: "dense_weight",
            ..
        })
    ));
}

#[test]
fn test_validate_rejects_negative_penalty() {
    let config = Config {
        diversity_penalty: -0.1,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_budgets() {
    let config = Config {
        max_answer_chars: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        collaborator_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_urls() {
    let config = Config {
        qdrant_url: "localhost:6334".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl { .. })
    ));

    let config = Config {
        embedding_url: Some("ftp://embed".to_string()),
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_nonexistent_cross_encoder_path() {
    let config = Config {
        cross_encoder_path: Some(PathBuf::from("/nonexistent/path/to/cross-encoder")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
}

#[test]
fn test_validate_cross_encoder_path_is_file() {
    let config = Config {
        cross_encoder_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_success_with_cross_encoder_dir() {
    let config = Config {
        cross_encoder_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src")),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_sub_configs_follow_settings() {
    let config = Config {
        dense_weight: 0.6,
        diversity_penalty: 0.05,
        collaborator_timeout: Duration::from_millis(250),
        max_context_tokens: 900,
        append_confidence: true,
        embedding_url: Some("http://embed:11434".to_string()),
        embedding_model: "bge".to_string(),
        ..Default::default()
    };

    let retrieval = config.retrieval_config();
    assert_eq!(retrieval.fusion.dense_weight, 0.6);
    assert_eq!(retrieval.diversity_penalty, 0.05);
    assert_eq!(retrieval.timeout, Duration::from_millis(250));

    assert_eq!(config.rerank_config().timeout, Duration::from_millis(250));
    assert_eq!(config.judge_config().timeout, Duration::from_millis(250));

    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.max_context_tokens, 900);
    assert!(pipeline.append_confidence);

    let embedding = config.embedding_config().expect("embedding configured");
    assert_eq!(embedding.model, "bge");
    assert_eq!(embedding.timeout, Duration::from_millis(250));

    assert!(!config.cross_encoder_config().is_configured());
    assert_eq!(config.generation_config().model, "qwen2.5:3b");
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = ConfigError::OutOfRange {
        name: "dense_weight",
        reason: "must be between 0.0 and 1.0, got 2".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "invalid dense_weight: must be between 0.0 and 1.0, got 2"
    );

    let err = ConfigError::PathNotFound {
        path: PathBuf::from("/missing"),
    };
    assert!(err.to_string().contains("/missing"));
}
