//! Length-based choice between on-device and proxy speech

use crate::delivery::{SpeechDelivery, Utterance};
use crate::error::SpeechResult;
use crate::language::LanguageHint;
use crate::sanitize::sanitize;
use async_trait::async_trait;
use std::sync::Arc;

/// Routes short text on-device and long text through the proxy
///
/// Starting speech on one path cancels the other, so the router as a whole
/// has at most one utterance in flight.
pub struct SpeechRouter {
    on_device: Arc<dyn SpeechDelivery>,
    proxy: Arc<dyn SpeechDelivery>,
    threshold_chars: usize,
}

impl SpeechRouter {
    #[must_use]
    pub fn new(
        on_device: Arc<dyn SpeechDelivery>,
        proxy: Arc<dyn SpeechDelivery>,
        threshold_chars: usize,
    ) -> Self {
        Self {
            on_device,
            proxy,
            threshold_chars,
        }
    }

    /// Whether `text` is short enough for on-device synthesis
    #[must_use]
    pub fn is_short(&self, text: &str) -> bool {
        sanitize(text).chars().count() <= self.threshold_chars
    }
}

#[async_trait]
impl SpeechDelivery for SpeechRouter {
    fn name(&self) -> &'static str {
        "router"
    }

    async fn speak(&self, text: &str, language: &LanguageHint) -> SpeechResult<Utterance> {
        let (chosen, other) = if self.is_short(text) {
            (&self.on_device, &self.proxy)
        } else {
            (&self.proxy, &self.on_device)
        };
        other.cancel_all();
        tracing::debug!(path = chosen.name(), "routing speech");
        chosen.speak(text, language).await
    }

    fn cancel_all(&self) {
        self.on_device.cancel_all();
        self.proxy.cancel_all();
    }
}
