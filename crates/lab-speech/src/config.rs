//! Speech configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Speech configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// TTS proxy endpoint
    pub proxy_endpoint: String,
    /// Proxy request timeout in seconds
    pub timeout_secs: u64,
    /// On-device speaking rate
    pub on_device_rate: f32,
    /// On-device pitch
    pub on_device_pitch: f32,
    /// Proxy speaking rate
    pub proxy_rate: f32,
    /// Proxy pitch offset
    pub proxy_pitch: f32,
    /// Maximum characters sent to the proxy after sanitization
    pub max_chars: usize,
    /// Longest text spoken on-device; longer text goes through the proxy
    pub proxy_threshold_chars: usize,
    /// Language used when the caller gives none
    pub default_language: String,
}

impl SpeechConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With proxy endpoint
    #[inline]
    #[must_use]
    pub fn with_proxy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.proxy_endpoint = endpoint.into();
        self
    }

    /// With proxy threshold
    #[inline]
    #[must_use]
    pub fn with_proxy_threshold(mut self, chars: usize) -> Self {
        self.proxy_threshold_chars = chars;
        self
    }

    /// With max characters
    #[inline]
    #[must_use]
    pub fn with_max_chars(mut self, chars: usize) -> Self {
        self.max_chars = chars;
        self
    }

    /// Proxy request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: "http://localhost:5000/api/tts/synthesize".to_string(),
            timeout_secs: 30,
            on_device_rate: 1.0,
            on_device_pitch: 1.05,
            proxy_rate: 1.0,
            proxy_pitch: 0.0,
            max_chars: 5000,
            proxy_threshold_chars: 280,
            default_language: "en".to_string(),
        }
    }
}
