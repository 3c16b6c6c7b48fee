//! Explanation service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text returned whenever an explanation could not be fetched
pub const FALLBACK_EXPLANATION: &str =
    "I'm sorry, I'm having trouble analyzing the simulation right now. Please try again in a moment.";

/// Query sent when the learner did not type one
pub const DEFAULT_STUDENT_QUERY: &str = "Explain the current state";

/// Explanation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplanationConfig {
    /// Guide endpoint of the AI service
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Scenario identifier sent with every request
    pub scenario_id: String,
    /// Subject (e.g. `Chemistry`)
    pub subject: String,
    /// Topic placed in the request context
    pub topic: String,
    /// Default free-text query
    pub student_query: String,
    /// Text returned on any failure
    pub fallback_text: String,
}

impl ExplanationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With subject and topic
    #[inline]
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>, topic: impl Into<String>) -> Self {
        self.subject = subject.into();
        self.topic = topic.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8001/api/conversation/guide".to_string(),
            timeout_secs: 30,
            scenario_id: "generic".to_string(),
            subject: String::new(),
            topic: String::new(),
            student_query: DEFAULT_STUDENT_QUERY.to_string(),
            fallback_text: FALLBACK_EXPLANATION.to_string(),
        }
    }
}
