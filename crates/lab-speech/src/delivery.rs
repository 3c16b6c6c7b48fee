//! Speech delivery contract
//!
//! Every path implements [`SpeechDelivery::speak`], which returns an
//! [`Utterance`]. The utterance can be cancelled at any time and resolves to a
//! [`PlaybackOutcome`] exactly once.

use crate::error::SpeechResult;
use crate::language::LanguageHint;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

static NEXT_UTTERANCE: AtomicU64 = AtomicU64::new(1);

/// Process-unique utterance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Allocate next id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_UTTERANCE.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// How an utterance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Stops a running playback
pub trait PlaybackControl: Send + Sync {
    /// Stop immediately and release the playback resource
    fn stop(&self);
}

/// Playback that needs no stopping (already finished)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopControl;

impl PlaybackControl for NoopControl {
    fn stop(&self) {}
}

/// Control attached after playback has started
///
/// A stop requested before attachment is applied on attach.
#[derive(Default)]
pub struct DeferredControl {
    inner: Mutex<Option<Arc<dyn PlaybackControl>>>,
    stopped: AtomicBool,
}

impl DeferredControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the real control
    pub fn attach(&self, control: Arc<dyn PlaybackControl>) {
        if self.stopped.load(Ordering::SeqCst) {
            control.stop();
            return;
        }
        *self.inner.lock() = Some(control);
    }
}

impl PlaybackControl for DeferredControl {
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let inner = self.inner.lock().take();
        if let Some(control) = inner {
            control.stop();
        }
    }
}

/// Implementation side of an utterance: reports the outcome once
pub struct PlaybackReporter {
    id: UtteranceId,
    tx: Mutex<Option<oneshot::Sender<PlaybackOutcome>>>,
}

impl PlaybackReporter {
    #[inline]
    #[must_use]
    pub fn id(&self) -> UtteranceId {
        self.id
    }

    /// Report the outcome; later reports are ignored
    pub fn finish(&self, outcome: PlaybackOutcome) {
        let tx = self.tx.lock().take();
        if let Some(tx) = tx {
            tracing::debug!(utterance = %self.id, ?outcome, "utterance finished");
            // Receiver may already be gone.
            let _ = tx.send(outcome);
        }
    }

    /// Whether an outcome was already reported
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.tx.lock().is_none()
    }
}

impl fmt::Debug for PlaybackReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackReporter")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Clonable cancel handle of an utterance
#[derive(Clone)]
pub struct CancelHandle {
    id: UtteranceId,
    control: Arc<dyn PlaybackControl>,
    reporter: Arc<PlaybackReporter>,
}

impl CancelHandle {
    #[inline]
    #[must_use]
    pub fn id(&self) -> UtteranceId {
        self.id
    }

    /// Stop playback; the utterance resolves to `Cancelled` unless it already ended
    pub fn cancel(&self) {
        if self.reporter.is_finished() {
            return;
        }
        self.control.stop();
        self.reporter.finish(PlaybackOutcome::Cancelled);
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

/// One piece of speech in flight
#[derive(Debug)]
pub struct Utterance {
    handle: CancelHandle,
    done: oneshot::Receiver<PlaybackOutcome>,
}

impl Utterance {
    /// Create an utterance and the reporter its implementation resolves
    #[must_use]
    pub fn start(control: Arc<dyn PlaybackControl>) -> (Self, Arc<PlaybackReporter>) {
        let id = UtteranceId::next();
        let (tx, done) = oneshot::channel();
        let reporter = Arc::new(PlaybackReporter {
            id,
            tx: Mutex::new(Some(tx)),
        });
        let utterance = Self {
            handle: CancelHandle {
                id,
                control,
                reporter: Arc::clone(&reporter),
            },
            done,
        };
        (utterance, reporter)
    }

    /// Utterance that already completed (e.g. zero-length playback)
    #[must_use]
    pub fn completed() -> Self {
        let (utterance, reporter) = Self::start(Arc::new(NoopControl));
        reporter.finish(PlaybackOutcome::Completed);
        utterance
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> UtteranceId {
        self.handle.id
    }

    /// Cancel handle usable after the utterance is consumed
    #[inline]
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Stop immediately
    #[inline]
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Wait for the outcome
    ///
    /// A reporter dropped without reporting counts as cancelled.
    pub async fn finished(self) -> PlaybackOutcome {
        self.done.await.unwrap_or(PlaybackOutcome::Cancelled)
    }

    /// Split into the cancel handle and the outcome future
    #[must_use]
    pub fn into_parts(self) -> (CancelHandle, oneshot::Receiver<PlaybackOutcome>) {
        (self.handle, self.done)
    }
}

/// A way of turning text into audible speech
#[async_trait]
pub trait SpeechDelivery: Send + Sync {
    /// Short path name for logs
    fn name(&self) -> &'static str;

    /// Start speaking `text`, cancelling whatever this path was speaking
    ///
    /// # Errors
    /// - `SpeechError::NoContent` if nothing is left to speak
    /// - `SpeechError::Delivery` on transport or playback failure
    async fn speak(&self, text: &str, language: &LanguageHint) -> SpeechResult<Utterance>;

    /// Stop whatever this path is speaking
    fn cancel_all(&self);
}

/// Tracks the single current utterance of a delivery path
#[derive(Debug, Default)]
pub struct ExclusiveChannel {
    current: Mutex<Option<CancelHandle>>,
}

impl ExclusiveChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current utterance, if any
    pub fn cancel_current(&self) {
        let current = self.current.lock().take();
        if let Some(handle) = current {
            handle.cancel();
        }
    }

    /// Record a new current utterance, cancelling the previous one
    pub fn replace(&self, handle: CancelHandle) {
        let previous = self.current.lock().replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingControl(AtomicUsize);

    impl PlaybackControl for CountingControl {
        fn stop(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn cancel_stops_once_and_resolves_cancelled() {
        let control = Arc::new(CountingControl::default());
        let (utterance, _reporter) = Utterance::start(control.clone());

        utterance.cancel();
        utterance.cancel();

        assert_eq!(control.0.load(Ordering::SeqCst), 1);
        assert_eq!(utterance.finished().await, PlaybackOutcome::Cancelled);
    }

    #[tokio::test]
    async fn cancel_after_completion_is_noop() {
        let control = Arc::new(CountingControl::default());
        let (utterance, reporter) = Utterance::start(control.clone());

        reporter.finish(PlaybackOutcome::Completed);
        utterance.cancel();

        assert_eq!(control.0.load(Ordering::SeqCst), 0);
        assert_eq!(utterance.finished().await, PlaybackOutcome::Completed);
    }

    #[tokio::test]
    async fn dropped_reporter_counts_as_cancelled() {
        let (utterance, reporter) = Utterance::start(Arc::new(NoopControl));
        let (handle, done) = utterance.into_parts();
        drop(reporter);
        drop(handle);
        assert!(done.await.is_err());
    }

    #[test]
    fn exclusive_channel_cancels_previous() {
        let first = Arc::new(CountingControl::default());
        let second = Arc::new(CountingControl::default());
        let (a, _ra) = Utterance::start(first.clone());
        let (b, _rb) = Utterance::start(second.clone());
        let channel = ExclusiveChannel::new();

        channel.replace(a.cancel_handle());
        channel.replace(b.cancel_handle());
        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 0);

        channel.cancel_current();
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_control_applies_early_stop_on_attach() {
        let deferred = DeferredControl::new();
        deferred.stop();
        let real = Arc::new(CountingControl::default());
        deferred.attach(real.clone());
        assert_eq!(real.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(UtteranceId::next(), UtteranceId::next());
    }
}
