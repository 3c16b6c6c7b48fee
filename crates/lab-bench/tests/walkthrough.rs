//! Scripted walkthroughs of the built-in simulations

use lab_bench::walkthrough::{self, Domain, WalkthroughOptions};
use lab_explain::{ExplanationCache, ExplanationConfig};
use lab_guide::GuideConfig;
use lab_test_utils::{RecordingDelivery, ScriptedExplanationBackend};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn chemistry_walkthrough_completes_and_narrates_every_task() {
    let delivery = Arc::new(RecordingDelivery::new());
    let report = walkthrough::run(
        Domain::Chemistry,
        delivery.clone(),
        None,
        &GuideConfig::default(),
        WalkthroughOptions::default(),
    )
    .await
    .unwrap();

    assert!(report.passed());
    assert_eq!(report.steps.len(), 6);
    assert_eq!(delivery.spoken().len(), 6);
    // The voice variant of the neutralisation line is spoken, not the display text.
    assert!(delivery.spoken()[3].contains("drop by drop"));
    assert!(report.steps[0].panel.iter().any(|l| l.starts_with("Great job!")));
}

#[tokio::test]
async fn optics_walkthrough_completes() {
    let delivery = Arc::new(RecordingDelivery::new());
    let report = walkthrough::run(
        Domain::Optics,
        delivery.clone(),
        None,
        &GuideConfig::default(),
        WalkthroughOptions::default(),
    )
    .await
    .unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.steps.len(), 8);
    assert_eq!(report.progress.completed, 8);
    assert_eq!(delivery.spoken().len(), 8);
}

#[tokio::test]
async fn without_gesture_nothing_is_spoken() {
    let delivery = Arc::new(RecordingDelivery::new());
    let options = WalkthroughOptions {
        gesture: false,
        ..WalkthroughOptions::default()
    };
    let report = walkthrough::run(Domain::Chemistry, delivery.clone(), None, &GuideConfig::default(), options)
        .await
        .unwrap();

    assert!(report.passed());
    assert!(delivery.spoken().is_empty());
}

#[tokio::test]
async fn muted_walkthrough_is_silent() {
    let delivery = Arc::new(RecordingDelivery::new());
    let options = WalkthroughOptions {
        muted: true,
        ..WalkthroughOptions::default()
    };
    let report = walkthrough::run(Domain::Optics, delivery.clone(), None, &GuideConfig::default(), options)
        .await
        .unwrap();

    assert!(report.passed());
    assert!(delivery.spoken().is_empty());
}

#[tokio::test]
async fn explanations_are_requested_per_task() {
    let backend = Arc::new(ScriptedExplanationBackend::new());
    let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::default());
    let delivery = Arc::new(RecordingDelivery::new());
    let options = WalkthroughOptions {
        explain: true,
        ..WalkthroughOptions::default()
    };
    let report = walkthrough::run(
        Domain::Chemistry,
        delivery.clone(),
        Some(cache),
        &GuideConfig::default(),
        options,
    )
    .await
    .unwrap();

    assert_eq!(backend.calls(), 6);
    assert_eq!(report.steps[0].explanation.as_deref(), Some("explanation #1"));
    assert_eq!(delivery.spoken().len(), 12);

    let tasks: Vec<_> = backend
        .requests()
        .iter()
        .map(|r| r.current_task_id.clone().map(|id| id.to_string()))
        .collect();
    assert_eq!(tasks[0].as_deref(), Some("task-1"));
    assert_eq!(tasks[5].as_deref(), Some("task-6"));
}

#[tokio::test]
async fn json_report_is_serializable() {
    let report = walkthrough::run(
        Domain::Optics,
        Arc::new(RecordingDelivery::new()),
        None,
        &GuideConfig::default(),
        WalkthroughOptions::default(),
    )
    .await
    .unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["domain"], "optics");
    assert_eq!(value["progress"]["total"], 8);
}
