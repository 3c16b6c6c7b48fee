//! Server-side text-to-speech proxy path
//!
//! Text is sanitized and capped, the language is mapped to a locale voice code,
//! the proxy returns audio bytes and an [`AudioSink`] plays them.

use crate::config::SpeechConfig;
use crate::delivery::{
    DeferredControl, ExclusiveChannel, PlaybackControl, PlaybackOutcome, PlaybackReporter,
    SpeechDelivery, Utterance,
};
use crate::error::{SpeechError, SpeechResult};
use crate::language::LanguageHint;
use crate::sanitize::prepare;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Body sent to the TTS proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub language_code: String,
    pub speaking_rate: f32,
    pub pitch: f32,
}

/// Audio returned by the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl AudioClip {
    /// Validate a proxy response body
    ///
    /// # Errors
    /// - `SpeechError::Delivery` for an empty body or a non-audio content type
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> SpeechResult<Self> {
        let content_type = content_type.into();
        if !content_type.trim_start().to_ascii_lowercase().starts_with("audio/") {
            return Err(SpeechError::delivery(format!(
                "expected audio, got content type {content_type:?}"
            )));
        }
        if bytes.is_empty() {
            return Err(SpeechError::delivery("received empty audio from server"));
        }
        Ok(Self {
            bytes,
            content_type,
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// TTS proxy seam
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Convert text to audio
    async fn synthesize(&self, request: &TtsRequest) -> SpeechResult<AudioClip>;
}

/// Where fetched audio is played
pub trait AudioSink: Send + Sync {
    /// Start playing `clip`; `reporter` must be resolved when playback ends
    ///
    /// # Errors
    /// - `SpeechError::Delivery` if playback could not start
    fn play(
        &self,
        clip: AudioClip,
        reporter: Arc<PlaybackReporter>,
    ) -> SpeechResult<Arc<dyn PlaybackControl>>;
}

/// JSON-over-HTTP TTS client
#[derive(Debug, Clone)]
pub struct HttpTtsClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTtsClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.proxy_endpoint.clone(), config.timeout())
    }
}

#[async_trait]
impl TtsClient for HttpTtsClient {
    async fn synthesize(&self, request: &TtsRequest) -> SpeechResult<AudioClip> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::delivery(format!(
                "tts proxy returned status {}",
                status.as_u16()
            )));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?;
        AudioClip::new(bytes.to_vec(), content_type)
    }
}

/// Proxy delivery path
pub struct ProxySpeech {
    client: Arc<dyn TtsClient>,
    sink: Arc<dyn AudioSink>,
    speaking_rate: f32,
    pitch: f32,
    max_chars: usize,
    channel: ExclusiveChannel,
}

impl ProxySpeech {
    #[must_use]
    pub fn new(client: Arc<dyn TtsClient>, sink: Arc<dyn AudioSink>, config: &SpeechConfig) -> Self {
        Self {
            client,
            sink,
            speaking_rate: config.proxy_rate,
            pitch: config.proxy_pitch,
            max_chars: config.max_chars,
            channel: ExclusiveChannel::new(),
        }
    }

    /// Request that would be sent for `text`
    ///
    /// # Errors
    /// - `SpeechError::NoContent` if nothing remains after sanitization
    pub fn request_for(&self, text: &str, language: &LanguageHint) -> SpeechResult<TtsRequest> {
        let text = prepare(text, self.max_chars);
        if text.is_empty() {
            return Err(SpeechError::NoContent);
        }
        Ok(TtsRequest {
            text,
            language_code: language.locale(),
            speaking_rate: self.speaking_rate,
            pitch: self.pitch,
        })
    }
}

#[async_trait]
impl SpeechDelivery for ProxySpeech {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn speak(&self, text: &str, language: &LanguageHint) -> SpeechResult<Utterance> {
        let request = self.request_for(text, language)?;
        self.channel.cancel_current();

        tracing::debug!(
            chars = request.text.chars().count(),
            language = %request.language_code,
            "requesting proxy speech"
        );
        let clip = match self.client.synthesize(&request).await {
            Ok(clip) => clip,
            Err(err) => {
                tracing::warn!(error = %err, "tts proxy request failed");
                return Err(err);
            }
        };

        let deferred = Arc::new(DeferredControl::new());
        let control: Arc<dyn PlaybackControl> = Arc::clone(&deferred) as Arc<dyn PlaybackControl>;
        let (utterance, reporter) = Utterance::start(control);
        match self.sink.play(clip, Arc::clone(&reporter)) {
            Ok(control) => deferred.attach(control),
            Err(err) => {
                reporter.finish(PlaybackOutcome::Failed(err.to_string()));
                return Err(err);
            }
        }
        self.channel.replace(utterance.cancel_handle());
        Ok(utterance)
    }

    fn cancel_all(&self) {
        self.channel.cancel_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::NoopControl;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct ImmediateSink {
        played: Mutex<Vec<usize>>,
    }

    impl AudioSink for ImmediateSink {
        fn play(
            &self,
            clip: AudioClip,
            reporter: Arc<PlaybackReporter>,
        ) -> SpeechResult<Arc<dyn PlaybackControl>> {
            self.played.lock().push(clip.len());
            reporter.finish(PlaybackOutcome::Completed);
            Ok(Arc::new(NoopControl))
        }
    }

    fn mp3() -> AudioClip {
        AudioClip::new(vec![0xff, 0xfb, 0x90], "audio/mpeg").unwrap()
    }

    #[test]
    fn clip_rejects_empty_or_non_audio() {
        assert!(AudioClip::new(Vec::new(), "audio/mpeg").is_err());
        assert!(AudioClip::new(vec![1], "application/json").is_err());
        assert!(AudioClip::new(vec![1], "Audio/MPEG").is_ok());
    }

    #[test]
    fn request_is_sanitized_and_mapped() {
        let speech = ProxySpeech::new(
            Arc::new(MockTtsClient::new()),
            Arc::new(ImmediateSink::default()),
            &SpeechConfig::default(),
        );
        let request = speech
            .request_for("# Heading\n**Bold** text", &LanguageHint::new("hi"))
            .unwrap();
        assert_eq!(
            request,
            TtsRequest {
                text: "Heading Bold text".into(),
                language_code: "hi-IN".into(),
                speaking_rate: 1.0,
                pitch: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn markup_only_text_never_reaches_proxy() {
        let mut client = MockTtsClient::new();
        client.expect_synthesize().times(0);
        let speech = ProxySpeech::new(
            Arc::new(client),
            Arc::new(ImmediateSink::default()),
            &SpeechConfig::default(),
        );
        let err = speech.speak("$$ ** ``", &LanguageHint::default()).await.unwrap_err();
        assert_eq!(err, SpeechError::NoContent);
    }

    #[tokio::test]
    async fn long_markup_is_capped_after_sanitization() {
        let mut client = MockTtsClient::new();
        client
            .expect_synthesize()
            .withf(|req| req.text.chars().count() == 20)
            .times(1)
            .returning(|_| Ok(mp3()));
        let sink = Arc::new(ImmediateSink::default());
        let speech = ProxySpeech::new(
            Arc::new(client),
            sink.clone(),
            &SpeechConfig::default().with_max_chars(20),
        );

        let text = format!("**{}**", "a".repeat(20));
        let utterance = speech.speak(&text, &LanguageHint::default()).await.unwrap();
        assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
        assert_eq!(*sink.played.lock(), vec![3]);
    }

    #[tokio::test]
    async fn transport_failure_is_delivery_error() {
        let mut client = MockTtsClient::new();
        client
            .expect_synthesize()
            .returning(|_| Err(SpeechError::delivery("connection refused")));
        let sink = Arc::new(ImmediateSink::default());
        let speech = ProxySpeech::new(Arc::new(client), sink.clone(), &SpeechConfig::default());

        let err = speech.speak("Read this", &LanguageHint::default()).await.unwrap_err();
        assert!(matches!(err, SpeechError::Delivery(_)));
        assert!(sink.played.lock().is_empty());
    }
}
