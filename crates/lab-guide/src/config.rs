//! Guide configuration

use lab_speech::LanguageHint;
use serde::{Deserialize, Serialize};

/// Guide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Language narration is spoken in
    pub language: String,
    /// Read explanations aloud as well as displaying them
    pub speak_explanations: bool,
    /// Panel open when the session starts
    pub start_open: bool,
    /// Voice muted when the session starts
    pub start_muted: bool,
}

impl GuideConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// With explanations read aloud or not
    #[inline]
    #[must_use]
    pub fn with_speak_explanations(mut self, speak: bool) -> Self {
        self.speak_explanations = speak;
        self
    }

    /// With initial mute state
    #[inline]
    #[must_use]
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.start_muted = muted;
        self
    }

    #[must_use]
    pub fn language_hint(&self) -> LanguageHint {
        LanguageHint::new(self.language.as_str())
    }
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            speak_explanations: true,
            start_open: true,
            start_muted: false,
        }
    }
}
