//! On-device speech synthesis
//!
//! Short guide lines are spoken by a local engine. Voice preference:
//! 1. exact regional match (`hi-IN` for `hi-IN`)
//! 2. language-family match (`hi-*`)
//! 3. the engine's default voice
//! 4. the first voice listed
//!
//! With no voices at all the engine speaks with its built-in default.

use crate::config::SpeechConfig;
use crate::delivery::{
    ExclusiveChannel, PlaybackControl, PlaybackOutcome, PlaybackReporter, SpeechDelivery,
    Utterance,
};
use crate::error::{SpeechError, SpeechResult};
use crate::language::LanguageHint;
use crate::sanitize::sanitize;
use async_trait::async_trait;
use std::sync::Arc;

/// Voice offered by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag as reported by the engine (`en-US`, `hi_IN`, ...)
    pub lang: String,
    pub is_default: bool,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            is_default: false,
        }
    }

    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    fn normalized_lang(&self) -> String {
        self.lang.replace('_', "-").to_ascii_lowercase()
    }
}

/// What the engine is asked to say
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

/// Local synthesis engine
#[cfg_attr(test, mockall::automock)]
pub trait SpeechEngine: Send + Sync {
    /// Voices currently available
    fn voices(&self) -> Vec<Voice>;

    /// Start speaking; `reporter` must be resolved when speech ends
    ///
    /// # Errors
    /// - `SpeechError::Delivery` if the engine refused the request
    fn speak(&self, request: SynthesisRequest, reporter: Arc<PlaybackReporter>) -> SpeechResult<()>;

    /// Stop speaking immediately
    fn cancel(&self);
}

/// Pick the preferred voice for a language
#[must_use]
pub fn select_voice(voices: &[Voice], language: &LanguageHint) -> Option<Voice> {
    let locale = language.locale().to_ascii_lowercase();
    let family = language.family();

    voices
        .iter()
        .find(|v| v.normalized_lang() == locale)
        .or_else(|| {
            voices.iter().find(|v| {
                v.normalized_lang()
                    .split('-')
                    .next()
                    .is_some_and(|f| f == family)
            })
        })
        .or_else(|| voices.iter().find(|v| v.is_default))
        .or_else(|| voices.first())
        .cloned()
}

struct EngineStop(Arc<dyn SpeechEngine>);

impl PlaybackControl for EngineStop {
    fn stop(&self) {
        self.0.cancel();
    }
}

/// On-device delivery path
pub struct OnDeviceSpeech {
    engine: Arc<dyn SpeechEngine>,
    rate: f32,
    pitch: f32,
    channel: ExclusiveChannel,
}

impl OnDeviceSpeech {
    /// Create with fixed rate and pitch
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>, config: &SpeechConfig) -> Self {
        Self {
            engine,
            rate: config.on_device_rate,
            pitch: config.on_device_pitch,
            channel: ExclusiveChannel::new(),
        }
    }
}

#[async_trait]
impl SpeechDelivery for OnDeviceSpeech {
    fn name(&self) -> &'static str {
        "on-device"
    }

    async fn speak(&self, text: &str, language: &LanguageHint) -> SpeechResult<Utterance> {
        let text = sanitize(text);
        if text.is_empty() {
            return Err(SpeechError::NoContent);
        }

        self.channel.cancel_current();
        self.engine.cancel();

        let voice = select_voice(&self.engine.voices(), language);
        tracing::debug!(
            voice = voice.as_ref().map_or("engine default", |v| v.name.as_str()),
            %language,
            "speaking on device"
        );
        let request = SynthesisRequest {
            text,
            voice,
            rate: self.rate,
            pitch: self.pitch,
        };

        let stop = Arc::new(EngineStop(Arc::clone(&self.engine)));
        let (utterance, reporter) = Utterance::start(stop);
        if let Err(err) = self.engine.speak(request, Arc::clone(&reporter)) {
            reporter.finish(PlaybackOutcome::Failed(err.to_string()));
            return Err(err);
        }
        self.channel.replace(utterance.cancel_handle());
        Ok(utterance)
    }

    fn cancel_all(&self) {
        self.channel.cancel_current();
        self.engine.cancel();
    }
}

/// Engine that writes speech to the log and finishes immediately
#[derive(Debug, Clone)]
pub struct ConsoleSpeechEngine {
    voices: Vec<Voice>,
}

impl ConsoleSpeechEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ConsoleSpeechEngine {
    fn default() -> Self {
        Self {
            voices: vec![
                Voice::new("Console English (US)", "en-US").as_default(),
                Voice::new("Console English (India)", "en-IN"),
                Voice::new("Console Hindi", "hi-IN"),
            ],
        }
    }
}

impl SpeechEngine for ConsoleSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, request: SynthesisRequest, reporter: Arc<PlaybackReporter>) -> SpeechResult<()> {
        let voice = request.voice.as_ref().map_or("default", |v| v.name.as_str());
        tracing::info!(target: "lab_speech::console", %voice, "{}", request.text);
        reporter.finish(PlaybackOutcome::Completed);
        Ok(())
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("US", "en-US").as_default(),
            Voice::new("India", "en_IN"),
            Voice::new("Hindi", "hi-IN"),
            Voice::new("Tamil Lanka", "ta-LK"),
        ]
    }

    fn chosen(language: &str) -> Option<String> {
        select_voice(&voices(), &LanguageHint::new(language)).map(|v| v.name)
    }

    #[test]
    fn exact_regional_match_wins() {
        assert_eq!(chosen("en").as_deref(), Some("India"));
        assert_eq!(chosen("hi").as_deref(), Some("Hindi"));
    }

    #[test]
    fn family_match_before_default() {
        assert_eq!(chosen("ta").as_deref(), Some("Tamil Lanka"));
    }

    #[test]
    fn default_voice_then_first() {
        assert_eq!(chosen("kn").as_deref(), Some("US"));
        let no_default = vec![Voice::new("A", "fr-FR"), Voice::new("B", "de-DE")];
        assert_eq!(
            select_voice(&no_default, &LanguageHint::new("kn")).map(|v| v.name),
            Some("A".to_string())
        );
        assert!(select_voice(&[], &LanguageHint::new("kn")).is_none());
    }

    #[tokio::test]
    async fn speak_uses_fixed_rate_and_pitch() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel().return_const(());
        engine.expect_voices().returning(voices);
        engine
            .expect_speak()
            .withf(|req, _| {
                req.text == "Add zinc"
                    && (req.rate - 1.0).abs() < f32::EPSILON
                    && (req.pitch - 1.05).abs() < f32::EPSILON
                    && req.voice.as_ref().map(|v| v.name.as_str()) == Some("India")
            })
            .times(1)
            .returning(|_, reporter| {
                reporter.finish(PlaybackOutcome::Completed);
                Ok(())
            });

        let speech = OnDeviceSpeech::new(Arc::new(engine), &SpeechConfig::default());
        let utterance = speech.speak("**Add zinc**", &LanguageHint::new("en")).await.unwrap();
        assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
    }

    #[tokio::test]
    async fn blank_text_is_no_content() {
        let engine = MockSpeechEngine::new();
        let speech = OnDeviceSpeech::new(Arc::new(engine), &SpeechConfig::default());
        let err = speech.speak("  ** ", &LanguageHint::default()).await.unwrap_err();
        assert_eq!(err, SpeechError::NoContent);
    }

    #[tokio::test]
    async fn engine_refusal_is_surfaced() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel().return_const(());
        engine.expect_voices().returning(Vec::new);
        engine
            .expect_speak()
            .returning(|_, _| Err(SpeechError::delivery("synthesis unavailable")));
        let speech = OnDeviceSpeech::new(Arc::new(engine), &SpeechConfig::default());

        let err = speech.speak("Observe", &LanguageHint::default()).await.unwrap_err();
        assert!(matches!(err, SpeechError::Delivery(_)));
    }

    #[tokio::test]
    async fn console_engine_completes_immediately() {
        let engine = Arc::new(ConsoleSpeechEngine::new());
        let speech = OnDeviceSpeech::new(engine, &SpeechConfig::default());
        let utterance = speech.speak("Hello", &LanguageHint::default()).await.unwrap();
        assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
    }
}
