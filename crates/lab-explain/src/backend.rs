//! Explanation backend seam and its HTTP implementation

use crate::config::ExplanationConfig;
use crate::error::{ExplainError, ExplainResult};
use async_trait::async_trait;
use lab_tasks::TaskId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request mode understood by the guide endpoint
pub const STATE_EXPLANATION_MODE: &str = "state_explanation";

/// Context block of an explanation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationContext {
    pub topic: String,
}

/// Body of an explanation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub scenario_id: String,
    pub current_task_id: Option<TaskId>,
    pub student_input: String,
    pub mode: String,
    pub subject: String,
    pub simulation_state: serde_json::Value,
    pub context: ExplanationContext,
}

impl ExplanationRequest {
    /// Build a state-explanation request from configuration
    #[must_use]
    pub fn state_explanation(
        config: &ExplanationConfig,
        task_id: Option<&TaskId>,
        snapshot: serde_json::Value,
    ) -> Self {
        Self {
            scenario_id: config.scenario_id.clone(),
            current_task_id: task_id.cloned(),
            student_input: config.student_query.clone(),
            mode: STATE_EXPLANATION_MODE.to_string(),
            subject: config.subject.clone(),
            simulation_state: snapshot,
            context: ExplanationContext {
                topic: config.topic.clone(),
            },
        }
    }

    /// With a learner-supplied query
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.student_input = query.into();
        self
    }
}

/// Body of an explanation response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub response: String,
    #[serde(default)]
    pub action: String,
}

/// Source of natural-language explanations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExplanationBackend: Send + Sync {
    /// Ask the backend to explain a state
    async fn explain(&self, request: &ExplanationRequest) -> ExplainResult<ExplanationResponse>;
}

/// JSON-over-HTTP backend
#[derive(Debug, Clone)]
pub struct HttpExplanationBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpExplanationBackend {
    /// Create backend for an endpoint
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Create backend from configuration
    #[must_use]
    pub fn from_config(config: &ExplanationConfig) -> Self {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    /// With a shared client
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExplanationBackend for HttpExplanationBackend {
    async fn explain(&self, request: &ExplanationRequest) -> ExplainResult<ExplanationResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplainError::Status {
                status: status.as_u16(),
            });
        }

        let body: ExplanationResponse = response
            .json()
            .await
            .map_err(|e| ExplainError::Decode(e.to_string()))?;
        if body.response.trim().is_empty() {
            return Err(ExplainError::EmptyResponse);
        }
        Ok(body)
    }
}
