//! End-to-end tests for whole runs: prompts -> results -> JSON snapshot

mod common;

use axum::http::StatusCode;

use harness::report::{load_summary, save_summary, RESULTS_FILE_PREFIX};
use harness::{ChatMode, Harness, HarnessConfig};

use common::*;

#[tokio::test]
async fn test_complete_stream_run() {
    let service = MockChatService::new()
        .stream_events(&[
            r#"{"type":"update","text":"Once","audio_url":"/audio/1.wav"}"#,
            r#"{"type":"done"}"#,
        ])
        .audio("/audio/1.wav", StatusCode::OK, sample_wav())
        .spawn()
        .await;
    let player = RecordingPlayer::new();
    let harness = Harness::new(
        test_config(&service.base_url, ChatMode::Stream),
        Box::new(player.clone()),
    )
    .unwrap();

    let cases = vec![
        "Tell me a short story about a brave knight.".to_string(),
        "What is the capital of France?".to_string(),
    ];
    let summary = harness.run_tests(&cases).await;

    assert_eq!(summary.total_tests, 2);
    assert_eq!(summary.successful_tests, 2);
    assert_eq!(summary.failed_tests, 0);
    assert_eq!(summary.success_rate, 100.0);
    assert!(summary.all_passed());
    assert_eq!(summary.latency.count, 2);
    assert_eq!(summary.audio.checked, 2);
    assert_eq!(summary.audio.passed, 2);

    let names: Vec<_> = summary.test_cases.iter().map(|c| c.test_name.as_str()).collect();
    assert_eq!(names, ["stream_01", "stream_02"]);
    let inputs: Vec<_> = summary.test_cases.iter().map(|c| c.input.as_str()).collect();
    assert_eq!(inputs, [cases[0].as_str(), cases[1].as_str()]);
    assert_eq!(player.played().len(), 2);
    assert_eq!(service.inputs().len(), 2);

    harness.finish().unwrap();
}

#[tokio::test]
async fn test_failing_case_does_not_stop_the_run() {
    let service = MockChatService::new()
        .chat_reply(StatusCode::OK, r#"{"response":"ok","audio_url":"/audio/gone.wav"}"#)
        .spawn()
        .await;
    let player = RecordingPlayer::new();
    let harness = Harness::new(
        test_config(&service.base_url, ChatMode::Chat),
        Box::new(player),
    )
    .unwrap();

    let cases = vec!["one".to_string(), "   ".to_string(), "three".to_string()];
    let summary = harness.run_tests(&cases).await;

    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.successful_tests, 0);
    assert_eq!(summary.failed_tests, 3);
    assert_eq!(summary.success_rate, 0.0);
    // the blank prompt never reaches the service
    assert_eq!(service.inputs().len(), 2);
    assert_eq!(summary.audio.checked, 2);
    assert_eq!(summary.audio.passed, 0);
}

#[tokio::test]
async fn test_mixed_run_snapshot_round_trip() {
    let service = MockChatService::new()
        .chat_reply(StatusCode::OK, r#"{"response":"Paris","audio_url":"/audio/1.wav"}"#)
        .audio("/audio/1.wav", StatusCode::OK, sample_wav())
        .spawn()
        .await;
    let harness = Harness::new(
        test_config(&service.base_url, ChatMode::Chat),
        Box::new(RecordingPlayer::new()),
    )
    .unwrap();

    let cases = vec![
        "What is the capital of France?".to_string(),
        String::new(),
        "And of Germany?".to_string(),
    ];
    let summary = harness.run_tests(&cases).await;
    assert_eq!(summary.successful_tests, 2);
    assert_eq!(summary.failed_tests, 1);
    assert!((summary.success_rate - 200.0 / 3.0).abs() < 1e-9);

    let results_dir = tempfile::tempdir().unwrap();
    let path = save_summary(&summary, results_dir.path()).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(RESULTS_FILE_PREFIX));

    let loaded = load_summary(&path).unwrap();
    assert_eq!(loaded, summary);
    assert_eq!(loaded.total_tests, 3);
    assert_eq!(loaded.test_cases[1].test_name, "chat_02");
    assert!(!loaded.test_cases[1].success);
}

#[tokio::test]
async fn test_empty_run() {
    let harness = Harness::new(
        test_config("http://127.0.0.1:9", ChatMode::Stream),
        Box::new(RecordingPlayer::new()),
    )
    .unwrap();

    let summary = harness.run_tests(&[]).await;

    assert_eq!(summary.total_tests, 0);
    assert_eq!(summary.successful_tests, 0);
    assert_eq!(summary.failed_tests, 0);
    assert_eq!(summary.success_rate, 0.0);
    assert!(summary.test_cases.is_empty());
    assert!(!summary.all_passed());
}

#[tokio::test]
async fn test_temporary_audio_is_cleaned_up() {
    let service = MockChatService::new()
        .chat_reply(StatusCode::OK, r#"{"response":"x","audio_url":"/audio/1.wav"}"#)
        .audio("/audio/1.wav", StatusCode::OK, sample_wav())
        .spawn()
        .await;
    let player = RecordingPlayer::new();
    let harness = Harness::new(
        test_config(&service.base_url, ChatMode::Chat),
        Box::new(player.clone()),
    )
    .unwrap();
    assert!(harness.store().is_scoped());
    let audio_dir = harness.store().dir().to_path_buf();

    let summary = harness.run_tests(&["Hi".to_string()]).await;
    assert!(summary.all_passed());
    assert!(player.played()[0].starts_with(&audio_dir));

    harness.finish().unwrap();
    assert!(!audio_dir.exists());
}

#[tokio::test]
async fn test_persistent_audio_is_kept() {
    let service = MockChatService::new()
        .chat_reply(StatusCode::OK, r#"{"response":"x","audio_url":"/audio/1.wav"}"#)
        .audio("/audio/1.wav", StatusCode::OK, sample_wav())
        .spawn()
        .await;
    let root = tempfile::tempdir().unwrap();
    let output_dir = root.path().join("test_outputs");
    let config = HarnessConfig {
        output_dir: Some(output_dir.clone()),
        ..test_config(&service.base_url, ChatMode::Chat)
    };
    let harness = Harness::new(config, Box::new(RecordingPlayer::new())).unwrap();

    let first = harness.run_tests(&["Hi".to_string()]).await;
    harness.finish().unwrap();

    let kept = first.test_cases[0].audio_results[0].file_path.clone().unwrap();
    assert!(kept.starts_with(&output_dir));
    assert!(kept.exists());
    assert!(kept
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_chat_01_audio_01.wav"));

    // a later run into the same directory keeps the earlier file intact
    let config = HarnessConfig {
        output_dir: Some(output_dir.clone()),
        ..test_config(&service.base_url, ChatMode::Chat)
    };
    let harness = Harness::new(config, Box::new(RecordingPlayer::new())).unwrap();
    let second = harness.run_tests(&["Hi again".to_string()]).await;
    harness.finish().unwrap();

    let newer = second.test_cases[0].audio_results[0].file_path.clone().unwrap();
    assert_ne!(newer, kept);
    assert!(kept.exists());
    assert!(newer.exists());
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let config = HarnessConfig {
        base_url: "localhost:8080".to_string(),
        ..HarnessConfig::default()
    };
    assert!(Harness::new(config, Box::new(RecordingPlayer::new())).is_err());
}
