use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::generation::MockGenerator;
use crate::types::{Chunk, ChunkMetadata, RankedCandidate};

fn candidate(id: &str, text: &str) -> RankedCandidate {
    RankedCandidate::new(Chunk::new(id, text, ChunkMetadata::new("doc")), 0.5)
}

/// Two of four candidates mention "revenue".
fn context() -> Vec<RankedCandidate> {
    vec![
        candidate("a", "Revenue grew 12% in 2021"),
        candidate("b", "revenue guidance is cautious"),
        candidate("c", "Operating costs were flat"),
        candidate("d", "Headcount rose slightly"),
    ]
}

fn model_judge(generator: MockGenerator) -> (AnswerJudge, Arc<MockGenerator>) {
    let generator = Arc::new(generator);
    let judge = AnswerJudge::with_model(
        generator.clone(),
        JudgeConfig::default().with_timeout(Duration::from_millis(200)),
    );
    (judge, generator)
}

#[test]
fn test_percent_conversions() {
    assert_eq!(from_percent(70.0), 0.7);
    assert_eq!(from_percent(150.0), 1.0);
    assert_eq!(from_percent(-5.0), 0.0);
    assert_eq!(to_percent(0.754), 75);
    assert_eq!(to_percent(2.0), 100);
    assert_eq!(normalize_threshold(70.0), 0.7);
    assert_eq!(normalize_threshold(0.7), 0.7);
    assert_eq!(normalize_threshold(1.0), 1.0);
}

#[test]
fn test_overlap_fraction() {
    assert_eq!(overlap_fraction("REVENUE trend", &context()), 0.5);
    assert_eq!(overlap_fraction("revenue", &[]), 0.0);
    assert_eq!(overlap_fraction("", &context()), 0.0);
}

#[tokio::test]
async fn test_empty_answer_short_circuits_without_calls() {
    let (judge, generator) = model_judge(MockGenerator::new(r#"{"supported": true}"#));

    for answer in ["", "   \n\t"] {
        let verdict = judge.judge("revenue", answer, &context()).await;
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.reason, "no answer provided");
        assert_eq!(verdict.method, JudgeMethod::NoAnswer);
    }
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_heuristic_only() {
    let judge = AnswerJudge::heuristic(JudgeConfig::default());
    let verdict = judge.judge("revenue", "It grew.", &context()).await;

    assert_eq!(verdict.score, 0.5);
    assert_eq!(verdict.method, JudgeMethod::Heuristic);
    assert!(verdict.reason.contains("2/4"));
    assert!(verdict.reason.contains("corroboration not run"));
}

#[tokio::test]
async fn test_supported_raises_floor() {
    let (judge, _) = model_judge(MockGenerator::new(
        r#"Verdict: {"supported": true, "reason": "matches chunk 1"}"#,
    ));
    let verdict = judge.judge("revenue", "It grew 12%.", &context()).await;

    assert_eq!(verdict.score, 0.8);
    assert_eq!(verdict.overlap, 0.5);
    assert_eq!(verdict.method, JudgeMethod::Corroborated { supported: true });
    assert!(verdict.reason.contains("2/4"));
    assert!(verdict.reason.contains("supported (matches chunk 1)"));
}

#[tokio::test]
async fn test_supported_keeps_higher_overlap() {
    let (judge, _) = model_judge(MockGenerator::new(r#"{"supported": true}"#));
    let all_match = vec![candidate("a", "revenue"), candidate("b", "revenue up")];

    let verdict = judge.judge("revenue", "Up.", &all_match).await;
    assert_eq!(verdict.score, 1.0);
}

#[tokio::test]
async fn test_unsupported_caps_score() {
    let (judge, _) = model_judge(MockGenerator::new(r#"{"supported": false}"#));
    let all_match = vec![candidate("a", "revenue"), candidate("b", "revenue up")];

    let verdict = judge.judge("revenue", "Down.", &all_match).await;
    assert_eq!(verdict.score, 0.7);
    assert_eq!(verdict.method, JudgeMethod::Corroborated { supported: false });
    assert!(verdict.reason.contains("unsupported"));
}

#[tokio::test]
async fn test_malformed_reply_falls_back_to_heuristic() {
    for reply in ["I think it is fine", r#"{"score": 95}"#, r#"{"supported": "#] {
        let (judge, _) = model_judge(MockGenerator::new(reply));
        let verdict = judge.judge("revenue", "It grew.", &context()).await;

        assert_eq!(verdict.score, 0.5);
        assert_eq!(verdict.method, JudgeMethod::CorroborationFailed);
        assert!(verdict.reason.contains("corroboration failed"));
        assert!((0.0..=1.0).contains(&verdict.score));
    }
}

#[tokio::test]
async fn test_model_error_falls_back_to_heuristic() {
    let (judge, _) = model_judge(MockGenerator::failing());
    let verdict = judge.judge("revenue", "It grew.", &context()).await;

    assert_eq!(verdict.method, JudgeMethod::CorroborationFailed);
    assert_eq!(verdict.score, 0.5);
}

#[tokio::test]
async fn test_model_timeout_falls_back_to_heuristic() {
    let (judge, _) = model_judge(
        MockGenerator::new(r#"{"supported": true}"#).with_delay(Duration::from_secs(2)),
    );
    let verdict = judge.judge("revenue", "It grew.", &context()).await;

    assert_eq!(verdict.method, JudgeMethod::CorroborationFailed);
}

#[tokio::test]
async fn test_prompt_uses_short_snippets() {
    let (judge, generator) = model_judge(MockGenerator::new(r#"{"supported": true}"#));
    let long = vec![candidate("a", &format!("revenue {}", "~".repeat(1000)))];

    judge.judge("revenue", "ok", &long).await;

    let prompt = &generator.prompts()[0];
    assert_eq!(prompt.matches('~').count(), 200 - "revenue ".len());
    assert!(prompt.contains("[1] page=? text_snip="));
}

#[test]
fn test_verdict_clamps_score() {
    assert_eq!(JudgeVerdict::new(1.7, "r", 0.2, JudgeMethod::Heuristic).score, 1.0);
    assert_eq!(JudgeVerdict::new(-0.3, "r", 0.2, JudgeMethod::Heuristic).score, 0.0);
    assert_eq!(JudgeVerdict::new(f32::NAN, "r", 0.2, JudgeMethod::Heuristic).score, 0.0);
}

#[test]
fn test_verdict_serializes_method_tag() {
    let verdict = JudgeVerdict::new(
        0.8,
        "r",
        0.5,
        JudgeMethod::Corroborated { supported: true },
    );
    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["method"]["kind"], "corroborated");
    assert_eq!(json["method"]["supported"], true);
}

#[tokio::test]
async fn test_scripted_judge_repeats_last_score() {
    let judge = ScriptedJudge::new([0.5, 0.75]);
    let ctx = context();
    assert_eq!(judge.judge("q", "a1", &ctx).await.score, 0.5);
    assert_eq!(judge.judge("q", "a2", &ctx).await.score, 0.75);
    assert_eq!(judge.judge("q", "a3", &ctx).await.score, 0.75);
    assert_eq!(judge.answers(), vec!["a1", "a2", "a3"]);
}
