//! Guide session
//!
//! Owns a [`TaskRunner`] and a [`NarrationController`] and carries out the
//! controller's commands against a [`SpeechDelivery`]. Every operation that
//! can change the store re-observes the task fields afterwards, so callers
//! never have to remember to notify the guide.
//!
//! Narration problems never surface as task errors: a failed utterance only
//! produces a notice on the panel.

use crate::config::GuideConfig;
use crate::controller::{DisplayKind, ExplanationTicket, NarrationCommand, NarrationController, SpeechToken};
use crate::script::GuideScript;
use crate::state::NarrationState;
use lab_explain::ExplanationCache;
use lab_speech::{CancelHandle, LanguageHint, PlaybackOutcome, SpeechDelivery};
use lab_tasks::{SimulationStore, StoreError, TaskId, TaskResult, TaskRunner};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// One line shown on the guide panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub kind: DisplayKind,
    pub text: String,
}

struct InFlight {
    token: SpeechToken,
    handle: CancelHandle,
    done: oneshot::Receiver<PlaybackOutcome>,
}

/// Explanation request detached from the session
///
/// Can be awaited inline or spawned; the reply is only applied if the
/// session is still in the context the job was created in.
pub struct ExplanationJob {
    ticket: ExplanationTicket,
    cache: ExplanationCache,
    state: serde_json::Value,
}

impl ExplanationJob {
    /// Fetch the explanation (cached or from the backend)
    pub async fn run(self) -> ExplanationReply {
        let text = self.cache.explain(self.ticket.task_id(), &self.state).await;
        ExplanationReply {
            ticket: self.ticket,
            text,
        }
    }
}

/// Finished explanation, ready to apply
#[derive(Debug, Clone)]
pub struct ExplanationReply {
    pub ticket: ExplanationTicket,
    pub text: String,
}

/// Task runner plus narration for one simulation
pub struct GuideSession<S: SimulationStore> {
    runner: TaskRunner<S>,
    controller: NarrationController,
    delivery: Arc<dyn SpeechDelivery>,
    language: LanguageHint,
    explainer: Option<ExplanationCache>,
    current: Option<InFlight>,
    transcript: Vec<PanelLine>,
}

impl<S: SimulationStore> GuideSession<S> {
    #[must_use]
    pub fn new(
        runner: TaskRunner<S>,
        script: GuideScript,
        delivery: Arc<dyn SpeechDelivery>,
        config: &GuideConfig,
    ) -> Self {
        Self {
            runner,
            controller: NarrationController::new(script, config),
            delivery,
            language: config.language_hint(),
            explainer: None,
            current: None,
            transcript: Vec::new(),
        }
    }

    /// With an explanation cache
    #[must_use]
    pub fn with_explainer(mut self, cache: ExplanationCache) -> Self {
        self.explainer = Some(cache);
        self
    }

    #[inline]
    #[must_use]
    pub fn runner(&self) -> &TaskRunner<S> {
        &self.runner
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        self.runner.store()
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &NarrationController {
        &self.controller
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> NarrationState {
        self.controller.state()
    }

    #[inline]
    #[must_use]
    pub fn language(&self) -> &LanguageHint {
        &self.language
    }

    /// Text currently on the panel
    #[must_use]
    pub fn panel(&self) -> Option<&PanelLine> {
        self.transcript.last()
    }

    /// Everything the panel has shown, oldest first
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> &[PanelLine] {
        &self.transcript
    }

    /// Whether an utterance is in flight
    #[inline]
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    /// Observe the store; the first call announces an already active task
    pub async fn refresh(&mut self) {
        let cmds = self
            .controller
            .observe(self.runner.active_task_id(), self.runner.completed_tasks());
        self.execute(cmds).await;
    }

    /// Activate a task and announce it
    ///
    /// # Errors
    /// Propagates [`TaskRunner::activate`] errors.
    pub async fn activate(&mut self, id: &TaskId) -> TaskResult<()> {
        self.runner.activate(id)?;
        self.refresh().await;
        Ok(())
    }

    /// Activate the next pending task
    ///
    /// # Errors
    /// Propagates [`TaskRunner::activate_next`] errors.
    pub async fn activate_next(&mut self) -> TaskResult<Option<TaskId>> {
        let next = self.runner.activate_next()?;
        self.refresh().await;
        Ok(next)
    }

    /// Apply a store mutation and evaluate the active task
    ///
    /// # Errors
    /// Propagates [`TaskRunner::update`] errors.
    pub async fn update<F>(&mut self, mutate: F) -> TaskResult<bool>
    where
        F: FnOnce(&mut S) -> Result<(), StoreError>,
    {
        let result = self.runner.update(mutate);
        self.refresh().await;
        result
    }

    /// Re-evaluate the active task
    ///
    /// # Errors
    /// Propagates [`TaskRunner::evaluate`] errors.
    pub async fn evaluate(&mut self) -> TaskResult<bool> {
        let result = self.runner.evaluate();
        self.refresh().await;
        result
    }

    /// Skip the active task; `false` when nothing is active
    ///
    /// # Errors
    /// Propagates [`TaskRunner::skip`] errors.
    pub async fn skip(&mut self) -> TaskResult<bool> {
        let Some(active) = self.runner.active_task_id().cloned() else {
            return Ok(false);
        };
        self.runner.skip(&active)?;
        self.refresh().await;
        Ok(true)
    }

    /// Reset the store and the guide's task history
    pub async fn reset(&mut self) {
        self.runner.reset();
        let cmds = self.controller.reset();
        self.execute(cmds).await;
        self.refresh().await;
    }

    pub async fn user_gesture(&mut self) {
        let cmds = self.controller.user_gesture();
        self.execute(cmds).await;
    }

    pub async fn set_muted(&mut self, muted: bool) {
        let cmds = self.controller.set_muted(muted);
        self.execute(cmds).await;
    }

    pub async fn toggle_mute(&mut self) {
        let cmds = self.controller.toggle_mute();
        self.execute(cmds).await;
    }

    pub async fn close(&mut self) {
        let cmds = self.controller.close();
        self.execute(cmds).await;
    }

    pub async fn open(&mut self) {
        let cmds = self.controller.open();
        self.execute(cmds).await;
    }

    /// Show the active task's hint
    pub async fn show_hint(&mut self) {
        let task_hint = self.runner.active_task().and_then(|t| t.hint.clone());
        let cmds = self.controller.show_hint(task_hint.as_deref());
        self.execute(cmds).await;
    }

    /// Prepare an explanation request for the current context
    ///
    /// `None` when no explainer is configured or the panel is closed.
    #[must_use]
    pub fn explanation_job(&self) -> Option<ExplanationJob> {
        let cache = self.explainer.clone()?;
        let ticket = self.controller.explanation_ticket()?;
        Some(ExplanationJob {
            ticket,
            cache,
            state: self.runner.store().snapshot(),
        })
    }

    /// Apply a finished explanation; `false` if it went stale
    pub async fn apply_explanation(&mut self, reply: ExplanationReply) -> bool {
        let cmds = self.controller.apply_explanation(&reply.ticket, reply.text);
        let applied = !cmds.is_empty();
        self.execute(cmds).await;
        applied
    }

    /// Request and apply an explanation inline
    pub async fn explain(&mut self) -> bool {
        let Some(job) = self.explanation_job() else {
            return false;
        };
        let reply = job.run().await;
        self.apply_explanation(reply).await
    }

    /// Collect the in-flight utterance's result without waiting
    pub async fn pump(&mut self) {
        let Some(flight) = self.current.as_mut() else {
            return;
        };
        let outcome = match flight.done.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => PlaybackOutcome::Cancelled,
        };
        let token = flight.token;
        self.current = None;
        self.on_outcome(token, outcome).await;
    }

    /// Wait until no utterance is in flight
    pub async fn settle(&mut self) {
        while let Some(InFlight { token, done, .. }) = self.current.take() {
            let outcome = done.await.unwrap_or(PlaybackOutcome::Cancelled);
            self.on_outcome(token, outcome).await;
        }
    }

    async fn on_outcome(&mut self, token: SpeechToken, outcome: PlaybackOutcome) {
        let cmds = match outcome {
            PlaybackOutcome::Completed | PlaybackOutcome::Cancelled => {
                self.controller.speech_finished(token)
            }
            PlaybackOutcome::Failed(reason) => self.controller.speech_failed(token, &reason),
        };
        self.execute(cmds).await;
    }

    fn cancel_current(&mut self) {
        if let Some(flight) = self.current.take() {
            tracing::debug!(token = %flight.token, utterance = %flight.handle.id(), "cancelling utterance");
            flight.handle.cancel();
        }
    }

    async fn execute(&mut self, cmds: Vec<NarrationCommand>) {
        let mut queue = VecDeque::from(cmds);
        while let Some(cmd) = queue.pop_front() {
            match cmd {
                NarrationCommand::CancelSpeech => self.cancel_current(),
                NarrationCommand::Display { kind, text } => {
                    tracing::debug!(?kind, "panel updated");
                    self.transcript.push(PanelLine { kind, text });
                }
                NarrationCommand::Speak { token, text, kind } => {
                    self.cancel_current();
                    tracing::debug!(%token, ?kind, backend = self.delivery.name(), "speaking");
                    match self.delivery.speak(&text, &self.language).await {
                        Ok(utterance) => {
                            let (handle, done) = utterance.into_parts();
                            self.current = Some(InFlight {
                                token,
                                handle,
                                done,
                            });
                        }
                        Err(err) => {
                            queue.extend(self.controller.speech_failed(token, &err.to_string()));
                        }
                    }
                }
            }
        }
    }
}

impl<S: SimulationStore> Drop for GuideSession<S> {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

/// Serializable view of a session, for status output
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub domain: &'static str,
    pub active_task_id: Option<TaskId>,
    pub completed_tasks: Vec<TaskId>,
    pub narration: &'static str,
    pub muted: bool,
    pub open: bool,
}

impl<S: SimulationStore> GuideSession<S> {
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            domain: self.runner.store().domain(),
            active_task_id: self.runner.active_task_id().cloned(),
            completed_tasks: self.runner.completed_tasks().to_vec(),
            narration: self.controller.state().as_str(),
            muted: self.controller.is_muted(),
            open: self.controller.is_open(),
        }
    }
}
