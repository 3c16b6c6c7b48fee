//! Testing utilities for the lab guide workspace
//!
//! Recording fakes for the speech and explanation seams.

#![allow(missing_docs)]

use async_trait::async_trait;
use lab_explain::{ExplainError, ExplainResult, ExplanationBackend, ExplanationRequest, ExplanationResponse};
use lab_speech::{
    AudioClip, AudioSink, LanguageHint, PlaybackControl, PlaybackOutcome, PlaybackReporter,
    SpeechDelivery, SpeechEngine, SpeechError, SpeechResult, SynthesisRequest, TtsClient, TtsRequest,
    Utterance, Voice,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingControl {
    stops: Arc<AtomicUsize>,
}

impl PlaybackControl for CountingControl {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Speech delivery that records what it was asked to say
///
/// `new()` completes every utterance immediately; `held()` keeps them in
/// flight until [`RecordingDelivery::finish_all`].
#[derive(Default)]
pub struct RecordingDelivery {
    hold: bool,
    spoken: Mutex<Vec<(String, LanguageHint)>>,
    open: Mutex<Vec<Arc<PlaybackReporter>>>,
    failure: Mutex<Option<SpeechError>>,
    stops: Arc<AtomicUsize>,
    cancel_all_calls: AtomicUsize,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> Self {
        Self {
            hold: true,
            ..Self::default()
        }
    }

    /// Fail every following `speak` with `error`, or stop failing with `None`
    pub fn fail_with(&self, error: Option<SpeechError>) {
        *self.failure.lock() = error;
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn languages(&self) -> Vec<LanguageHint> {
        self.spoken.lock().iter().map(|(_, l)| l.clone()).collect()
    }

    /// Number of utterances stopped through their cancel handle
    pub fn cancel_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn cancel_all_calls(&self) -> usize {
        self.cancel_all_calls.load(Ordering::SeqCst)
    }

    /// Complete every held utterance
    pub fn finish_all(&self) {
        let open: Vec<_> = self.open.lock().drain(..).collect();
        for reporter in open {
            reporter.finish(PlaybackOutcome::Completed);
        }
    }

    /// Fail every held utterance mid-playback
    pub fn fail_all(&self, reason: &str) {
        let open: Vec<_> = self.open.lock().drain(..).collect();
        for reporter in open {
            reporter.finish(PlaybackOutcome::Failed(reason.to_string()));
        }
    }
}

#[async_trait]
impl SpeechDelivery for RecordingDelivery {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn speak(&self, text: &str, language: &LanguageHint) -> SpeechResult<Utterance> {
        self.spoken.lock().push((text.to_string(), language.clone()));
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let control = CountingControl {
            stops: Arc::clone(&self.stops),
        };
        let (utterance, reporter) = Utterance::start(Arc::new(control));
        if self.hold {
            self.open.lock().push(reporter);
        } else {
            reporter.finish(PlaybackOutcome::Completed);
        }
        Ok(utterance)
    }

    fn cancel_all(&self) {
        self.cancel_all_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// On-device engine that records synthesis requests
pub struct RecordingSpeechEngine {
    voices: Vec<Voice>,
    hold: bool,
    requests: Mutex<Vec<SynthesisRequest>>,
    open: Mutex<Vec<Arc<PlaybackReporter>>>,
    cancels: AtomicUsize,
}

impl RecordingSpeechEngine {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            hold: false,
            requests: Mutex::new(Vec::new()),
            open: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Keep utterances in flight until [`RecordingSpeechEngine::finish_all`]
    #[must_use]
    pub fn holding(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn finish_all(&self) {
        let open: Vec<_> = self.open.lock().drain(..).collect();
        for reporter in open {
            reporter.finish(PlaybackOutcome::Completed);
        }
    }
}

impl SpeechEngine for RecordingSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, request: SynthesisRequest, reporter: Arc<PlaybackReporter>) -> SpeechResult<()> {
        self.requests.lock().push(request);
        if self.hold {
            self.open.lock().push(reporter);
        } else {
            reporter.finish(PlaybackOutcome::Completed);
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// TTS client answering every request with the same short clip
#[derive(Default)]
pub struct CannedTtsClient {
    requests: Mutex<Vec<TtsRequest>>,
    failure: Mutex<Option<SpeechError>>,
}

impl CannedTtsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following request with `error`, or stop failing with `None`
    pub fn fail_with(&self, error: Option<SpeechError>) {
        *self.failure.lock() = error;
    }

    pub fn requests(&self) -> Vec<TtsRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TtsClient for CannedTtsClient {
    async fn synthesize(&self, request: &TtsRequest) -> SpeechResult<AudioClip> {
        self.requests.lock().push(request.clone());
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        AudioClip::new(b"ID3\x04fake-mp3".to_vec(), "audio/mpeg")
    }
}

/// Audio sink that records clips and keeps playback open until finished
#[derive(Default)]
pub struct RecordingAudioSink {
    clips: Mutex<Vec<AudioClip>>,
    open: Mutex<Vec<Arc<PlaybackReporter>>>,
    stops: Arc<AtomicUsize>,
}

impl RecordingAudioSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clips(&self) -> Vec<AudioClip> {
        self.clips.lock().clone()
    }

    /// Number of playbacks stopped before they finished
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn finish_all(&self) {
        let open: Vec<_> = self.open.lock().drain(..).collect();
        for reporter in open {
            reporter.finish(PlaybackOutcome::Completed);
        }
    }
}

impl AudioSink for RecordingAudioSink {
    fn play(
        &self,
        clip: AudioClip,
        reporter: Arc<PlaybackReporter>,
    ) -> SpeechResult<Arc<dyn PlaybackControl>> {
        self.clips.lock().push(clip);
        self.open.lock().push(reporter);
        Ok(Arc::new(CountingControl {
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// Explanation backend with queued replies
///
/// When the queue is empty it answers with `"explanation #<n>"`.
#[derive(Default)]
pub struct ScriptedExplanationBackend {
    replies: Mutex<VecDeque<ExplainResult<String>>>,
    requests: Mutex<Vec<ExplanationRequest>>,
}

impl ScriptedExplanationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    #[must_use]
    pub fn fail(self, error: ExplainError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ExplanationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ExplanationBackend for ScriptedExplanationBackend {
    async fn explain(&self, request: &ExplanationRequest) -> ExplainResult<ExplanationResponse> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("explanation #{call}")));
        reply.map(|response| ExplanationResponse {
            response,
            action: String::new(),
        })
    }
}
