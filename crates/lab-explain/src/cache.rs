//! Explanation cache using moka
//!
//! Memoizes explanation text by state signature:
//! - Hit: cached text, no backend call
//! - Miss: backend call; success is stored, failure yields fallback text and is not stored
//!
//! The table has no capacity bound and no TTL. Concurrent misses for the same
//! signature may each reach the backend; the last successful answer wins.

use crate::backend::{ExplanationBackend, ExplanationRequest};
use crate::config::ExplanationConfig;
use crate::signature::{default_signature, SignatureFn};
use lab_tasks::TaskId;
use moka::future::Cache;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Memoizing explanation front-end
#[derive(Clone)]
pub struct ExplanationCache {
    inner: Cache<String, String>,
    backend: Arc<dyn ExplanationBackend>,
    signature: SignatureFn,
    config: Arc<ExplanationConfig>,
}

impl ExplanationCache {
    /// Create cache over a backend with the default signature
    #[must_use]
    pub fn new(backend: Arc<dyn ExplanationBackend>, config: ExplanationConfig) -> Self {
        Self {
            inner: Cache::builder().build(),
            backend,
            signature: default_signature(),
            config: Arc::new(config),
        }
    }

    /// With a caller-supplied signature function
    #[must_use]
    pub fn with_signature(mut self, signature: SignatureFn) -> Self {
        self.signature = signature;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ExplanationConfig {
        &self.config
    }

    /// Signature of a snapshot under this cache's signature function
    #[inline]
    #[must_use]
    pub fn signature_of(&self, snapshot: &Value) -> String {
        (self.signature)(snapshot)
    }

    /// Explain a state snapshot
    ///
    /// Never fails: backend errors produce the configured fallback text.
    pub async fn explain(&self, task_id: Option<&TaskId>, snapshot: &Value) -> String {
        let key = self.signature_of(snapshot);
        if let Some(text) = self.inner.get(&key).await {
            tracing::debug!(signature = %key, "explanation cache hit");
            return text;
        }

        tracing::debug!(signature = %key, "explanation cache miss");
        let request =
            ExplanationRequest::state_explanation(&self.config, task_id, snapshot.clone());
        match self.backend.explain(&request).await {
            Ok(response) => {
                self.inner.insert(key, response.response.clone()).await;
                response.response
            }
            Err(err) => {
                tracing::warn!(error = %err, "explanation request failed, using fallback");
                self.config.fallback_text.clone()
            }
        }
    }

    /// Cached text for a snapshot, without touching the backend
    pub async fn cached(&self, snapshot: &Value) -> Option<String> {
        self.inner.get(&self.signature_of(snapshot)).await
    }

    /// Check if a snapshot has been explained
    pub async fn contains(&self, snapshot: &Value) -> bool {
        self.cached(snapshot).await.is_some()
    }

    /// Drop every entry
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl fmt::Debug for ExplanationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationCache")
            .field("entry_count", &self.inner.entry_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ExplanationResponse, MockExplanationBackend};
    use crate::config::FALLBACK_EXPLANATION;
    use crate::error::ExplainError;
    use crate::signature::projected;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn answer(text: &str) -> ExplanationResponse {
        ExplanationResponse {
            response: text.to_string(),
            action: String::new(),
        }
    }

    #[tokio::test]
    async fn identical_snapshot_hits_backend_once() {
        let mut backend = MockExplanationBackend::new();
        backend
            .expect_explain()
            .times(1)
            .returning(|_| Ok(answer("Blue litmus turns red in acid.")));
        let cache = ExplanationCache::new(Arc::new(backend), ExplanationConfig::new());
        let state = json!({"indicator": "litmus_blue", "chemicalA": "hcl"});

        let first = cache.explain(None, &state).await;
        let second = cache.explain(None, &state).await;

        assert_eq!(first, "Blue litmus turns red in acid.");
        assert_eq!(second, first);
        assert_eq!(cache.stats().await.entry_count, 1);
    }

    #[tokio::test]
    async fn differing_snapshot_always_reaches_backend() {
        let mut backend = MockExplanationBackend::new();
        backend
            .expect_explain()
            .times(2)
            .returning(|req| Ok(answer(&format!("ph {}", req.simulation_state["ph"]))));
        let cache = ExplanationCache::new(Arc::new(backend), ExplanationConfig::new());

        assert_eq!(cache.explain(None, &json!({"ph": 1})).await, "ph 1");
        assert_eq!(cache.explain(None, &json!({"ph": 13})).await, "ph 13");
    }

    #[tokio::test]
    async fn failure_returns_fallback_and_is_not_cached() {
        let mut backend = MockExplanationBackend::new();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_explain()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ExplainError::Status { status: 503 }));
        backend
            .expect_explain()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(answer("Recovered.")));
        let cache = ExplanationCache::new(Arc::new(backend), ExplanationConfig::new());
        let state = json!({"metal": "zinc"});

        assert_eq!(cache.explain(None, &state).await, FALLBACK_EXPLANATION);
        assert!(!cache.contains(&state).await);
        assert_eq!(cache.explain(None, &state).await, "Recovered.");
        assert!(cache.contains(&state).await);
    }

    #[tokio::test]
    async fn request_carries_task_and_config() {
        let mut backend = MockExplanationBackend::new();
        backend
            .expect_explain()
            .withf(|req| {
                req.current_task_id.as_ref().map(TaskId::as_str) == Some("task-4")
                    && req.subject == "Chemistry"
                    && req.mode == "state_explanation"
            })
            .times(1)
            .returning(|_| Ok(answer("ok")));
        let config = ExplanationConfig::new().with_subject("Chemistry", "Acids, Bases and Salts");
        let cache = ExplanationCache::new(Arc::new(backend), config);

        cache
            .explain(Some(&TaskId::from("task-4")), &json!({}))
            .await;
    }

    /// Holds every call at a barrier until `width` calls are in flight
    struct GatedBackend {
        gate: Barrier,
        calls: AtomicUsize,
    }

    impl GatedBackend {
        fn new(width: usize) -> Self {
            Self {
                gate: Barrier::new(width),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ExplanationBackend for GatedBackend {
        async fn explain(
            &self,
            _request: &ExplanationRequest,
        ) -> crate::error::ExplainResult<ExplanationResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.gate.wait().await;
            Ok(answer(&format!("answer {n}")))
        }
    }

    #[tokio::test]
    async fn overlapping_misses_settle_into_one_entry() {
        let backend = Arc::new(GatedBackend::new(2));
        let cache = ExplanationCache::new(backend.clone(), ExplanationConfig::new());
        let state = json!({"chemicalA": "hcl", "chemicalB": "naoh", "ph": 7});

        let (a, b) = tokio::join!(cache.explain(None, &state), cache.explain(None, &state));
        assert!(backend.calls() <= 2);
        assert!(a.starts_with("answer ") && b.starts_with("answer "));

        let stored = cache.cached(&state).await.unwrap();
        assert!(stored == a || stored == b);
        let third = cache.explain(None, &state).await;
        assert_eq!(third, stored);
        assert_eq!(backend.calls(), 2);
        assert_eq!(cache.stats().await.entry_count, 1);
    }

    #[tokio::test]
    async fn custom_signature_collapses_irrelevant_changes() {
        let mut backend = MockExplanationBackend::new();
        backend
            .expect_explain()
            .times(1)
            .returning(|_| Ok(answer("Zinc in HCl.")));
        let cache = ExplanationCache::new(Arc::new(backend), ExplanationConfig::new())
            .with_signature(projected(&["metal"]));

        cache.explain(None, &json!({"metal": "zinc", "temperature": 25})).await;
        let again = cache
            .explain(None, &json!({"metal": "zinc", "temperature": 31}))
            .await;
        assert_eq!(again, "Zinc in HCl.");
    }
}
