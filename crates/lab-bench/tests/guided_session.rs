//! Task runner, narration, explanations and speech working together

use lab_explain::{ExplainError, ExplanationCache, ExplanationConfig, FALLBACK_EXPLANATION};
use lab_guide::{DisplayKind, GuideConfig, GuideMessage, GuideScript, GuideSession, NarrationState};
use lab_speech::{OnDeviceSpeech, ProxySpeech, SpeechConfig, SpeechDelivery, SpeechRouter, SpoolAudioSink, Voice};
use lab_tasks::{SimulationStore, Task, TaskId, TaskList, TaskProgress, TaskRunner, TaskTracking};
use lab_test_utils::{
    CannedTtsClient, RecordingAudioSink, RecordingDelivery, RecordingSpeechEngine,
    ScriptedExplanationBackend,
};
use pretty_assertions::assert_eq;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Gas {
    None,
    H2,
    Co2,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GasStore {
    gas: Gas,
    #[serde(flatten)]
    progress: TaskProgress,
}

impl GasStore {
    fn new() -> Self {
        Self {
            gas: Gas::None,
            progress: TaskProgress::new(),
        }
    }
}

impl TaskTracking for GasStore {
    fn progress(&self) -> &TaskProgress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut TaskProgress {
        &mut self.progress
    }
}

impl SimulationStore for GasStore {
    fn domain(&self) -> &'static str {
        "gas"
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

fn gas_task(id: &str, target: Gas) -> Task<GasStore> {
    Task::new(id, format!("Produce {target:?}"))
        .with_setup(|s: &mut GasStore| {
            s.gas = Gas::None;
            Ok(())
        })
        .with_validation(move |s: &GasStore| s.gas == target)
}

fn t1() -> TaskId {
    TaskId::from("T1")
}

fn t2() -> TaskId {
    TaskId::from("T2")
}

fn long_narration() -> String {
    "Carbon dioxide is heavier than air and does not support burning. ".repeat(6)
}

fn script() -> GuideScript {
    GuideScript::new()
        .with(
            "T1",
            GuideMessage::new("Make **hydrogen** with zinc and acid.")
                .with_voice("Make hydrogen with zinc and acid.")
                .with_completion("Hydrogen burns with a pop."),
        )
        .with(
            "T2",
            GuideMessage::new(long_narration()).with_completion("Lime water turned milky."),
        )
}

fn runner() -> TaskRunner<GasStore> {
    let tasks = TaskList::new(vec![gas_task("T1", Gas::H2), gas_task("T2", Gas::Co2)]).unwrap();
    TaskRunner::new(GasStore::new(), tasks)
}

fn session(delivery: Arc<dyn SpeechDelivery>) -> GuideSession<GasStore> {
    GuideSession::new(runner(), script(), delivery, &GuideConfig::default())
}

#[tokio::test]
async fn two_task_scenario_narrates_each_task_once() {
    let delivery = Arc::new(RecordingDelivery::new());
    let mut s = session(delivery.clone());
    s.user_gesture().await;

    s.activate(&t1()).await.unwrap();
    assert_eq!(s.store().gas, Gas::None);
    for _ in 0..10 {
        s.refresh().await;
    }
    assert!(s.update(|st| {
        st.gas = Gas::H2;
        Ok(())
    })
    .await
    .unwrap());
    assert!(s.runner().active_task_id().is_none());
    assert_eq!(s.panel().unwrap().text, "Hydrogen burns with a pop.");

    s.activate(&t2()).await.unwrap();
    assert_eq!(s.store().gas, Gas::None);
    assert!(s.update(|st| {
        st.gas = Gas::Co2;
        Ok(())
    })
    .await
    .unwrap());
    assert!(!s.evaluate().await.unwrap());

    assert_eq!(s.runner().completed_tasks(), &[t1(), t2()]);
    assert_eq!(
        delivery.spoken(),
        vec!["Make hydrogen with zinc and acid.".to_string(), long_narration()]
    );
    s.settle().await;
    assert_eq!(s.state(), NarrationState::Idle);
}

#[tokio::test]
async fn gesture_after_activation_speaks_exactly_once() {
    let delivery = Arc::new(RecordingDelivery::new());
    let mut s = session(delivery.clone());

    s.activate(&t1()).await.unwrap();
    s.refresh().await;
    assert!(delivery.spoken().is_empty());

    s.user_gesture().await;
    s.user_gesture().await;
    s.refresh().await;
    assert_eq!(delivery.spoken().len(), 1);
}

#[tokio::test]
async fn narration_failure_never_blocks_progress() {
    let delivery = Arc::new(RecordingDelivery::new());
    delivery.fail_with(Some(lab_speech::SpeechError::delivery("no audio device")));
    let mut s = session(delivery.clone());
    s.user_gesture().await;

    s.activate(&t1()).await.unwrap();
    assert_eq!(s.panel().unwrap().kind, DisplayKind::Notice);
    let done = s
        .update(|st| {
            st.gas = Gas::H2;
            Ok(())
        })
        .await
        .unwrap();
    assert!(done);
    assert_eq!(s.runner().progress().completed, 1);
}

#[tokio::test]
async fn identical_state_is_explained_from_cache() {
    let backend = Arc::new(ScriptedExplanationBackend::new().reply("Zinc displaces hydrogen."));
    let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::default().with_subject("Chemistry", "Gases"));
    let delivery = Arc::new(RecordingDelivery::new());
    let mut s = session(delivery.clone()).with_explainer(cache);
    s.user_gesture().await;
    s.activate(&t1()).await.unwrap();

    assert!(s.explain().await);
    assert!(s.explain().await);
    assert_eq!(backend.calls(), 1);
    assert_eq!(s.panel().unwrap().text, "Zinc displaces hydrogen.");

    let request = &backend.requests()[0];
    assert_eq!(request.current_task_id, Some(t1()));
    assert_eq!(request.simulation_state["gas"], "none");
    assert_eq!(request.subject, "Chemistry");

    s.update(|st| {
        st.gas = Gas::Co2;
        Ok(())
    })
    .await
    .unwrap();
    assert!(s.explain().await);
    assert_eq!(backend.calls(), 2);

    // Explanations are read aloud after the announcement.
    assert_eq!(delivery.spoken()[1], "Zinc displaces hydrogen.");
}

#[tokio::test]
async fn backend_failure_shows_fallback_and_retries_later() {
    let backend = Arc::new(
        ScriptedExplanationBackend::new()
            .fail(ExplainError::Status { status: 503 })
            .reply("Recovered."),
    );
    let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::default());
    let mut s = session(Arc::new(RecordingDelivery::new())).with_explainer(cache);
    s.activate(&t1()).await.unwrap();

    assert!(s.explain().await);
    assert_eq!(s.panel().unwrap().text, FALLBACK_EXPLANATION);
    assert!(s.explain().await);
    assert_eq!(s.panel().unwrap().text, "Recovered.");
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn explanation_for_previous_task_is_discarded() {
    let backend = Arc::new(ScriptedExplanationBackend::new());
    let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::default());
    let mut s = session(Arc::new(RecordingDelivery::new())).with_explainer(cache);
    s.activate(&t1()).await.unwrap();

    let job = s.explanation_job().unwrap();
    let pending = tokio::spawn(job.run());
    s.activate(&t2()).await.unwrap();

    let reply = pending.await.unwrap();
    let shown = s.transcript().len();
    assert!(!s.apply_explanation(reply).await);
    assert_eq!(s.transcript().len(), shown);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn closed_panel_blocks_explanations() {
    let backend = Arc::new(ScriptedExplanationBackend::new());
    let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::default());
    let mut s = session(Arc::new(RecordingDelivery::new())).with_explainer(cache);
    s.activate(&t1()).await.unwrap();
    s.close().await;

    assert!(!s.explain().await);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn router_sends_long_narration_through_proxy() {
    let config = SpeechConfig::default();
    let engine = Arc::new(RecordingSpeechEngine::new(vec![Voice::new("India", "en-IN")]).holding());
    let tts = Arc::new(CannedTtsClient::new());
    let sink = Arc::new(RecordingAudioSink::new());
    let router = SpeechRouter::new(
        Arc::new(OnDeviceSpeech::new(engine.clone(), &config)),
        Arc::new(ProxySpeech::new(tts.clone(), sink.clone(), &config)),
        config.proxy_threshold_chars,
    );
    let mut s = session(Arc::new(router));
    s.user_gesture().await;

    s.activate(&t1()).await.unwrap();
    assert_eq!(engine.requests().len(), 1);
    assert_eq!(engine.requests()[0].text, "Make hydrogen with zinc and acid.");
    assert!(tts.requests().is_empty());

    s.activate(&t2()).await.unwrap();
    assert_eq!(tts.requests().len(), 1);
    assert_eq!(tts.requests()[0].language_code, "en-IN");
    assert_eq!(sink.clips().len(), 1);
    assert!(engine.cancels() >= 1);

    s.close().await;
    assert_eq!(sink.stops(), 1);
    assert!(!s.is_speaking());
}

#[tokio::test]
async fn proxy_audio_lands_in_spool_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = SpeechConfig::default();
    let proxy = ProxySpeech::new(
        Arc::new(CannedTtsClient::new()),
        Arc::new(SpoolAudioSink::new(dir.path()).unwrap()),
        &config,
    );
    let mut s = session(Arc::new(proxy));
    s.user_gesture().await;
    s.activate(&t2()).await.unwrap();
    s.settle().await;

    assert!(dir.path().join("0001.mp3").exists());
    assert_eq!(s.state(), NarrationState::Silent);
}
