//! Narration controller
//!
//! Pure decision logic of the guide. Every event returns the commands the
//! session must carry out; the controller itself performs no I/O.
//!
//! # Dedupe
//!
//! Announcements depend only on the identity of the active task. The last
//! announced id is recorded when `Announcing` is entered, so repeated
//! observations of the same task never re-trigger speech.
//!
//! # Deferred delivery
//!
//! An announcement waits in `Announcing` until the user has interacted, the
//! guide is unmuted and the panel is open. It is delivered exactly once when
//! the last blocking condition clears, as long as its task is still active.
//!
//! # Stale results
//!
//! Every task change and every close bumps an epoch. Explanation tickets carry
//! the epoch and task they were issued for; speech carries a token. Results
//! whose ticket or token no longer matches are dropped.

use crate::config::GuideConfig;
use crate::script::GuideScript;
use crate::state::{is_allowed, NarrationState};
use lab_tasks::TaskId;
use std::fmt;

/// Identifies one speech request issued by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeechToken(u64);

impl fmt::Display for SpeechToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "speech-{}", self.0)
    }
}

/// Why something is spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechKind {
    /// First delivery of a task's narration
    Announcement,
    /// Narration repeated after the panel was reopened
    Replay,
    /// Explanation read aloud
    Explanation,
}

/// What kind of text the panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Instruction,
    Completion,
    Hint,
    Explanation,
    /// User-visible delivery problem
    Notice,
}

/// Side effect requested by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationCommand {
    /// Start speaking, after cancelling anything in flight
    Speak {
        token: SpeechToken,
        text: String,
        kind: SpeechKind,
    },
    /// Stop the utterance in flight
    CancelSpeech,
    /// Replace the panel text
    Display { kind: DisplayKind, text: String },
}

/// Proof of the context an explanation was requested in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationTicket {
    task_id: Option<TaskId>,
    epoch: u64,
}

impl ExplanationTicket {
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }
}

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    kind: SpeechKind,
}

/// Narration state for one guide session
#[derive(Debug, Clone)]
pub struct NarrationController {
    script: GuideScript,
    speak_explanations: bool,
    state: NarrationState,
    is_open: bool,
    is_muted: bool,
    user_interacted: bool,
    speaking: Option<SpeechToken>,
    next_token: u64,
    active_task_id: Option<TaskId>,
    last_spoken_task_id: Option<TaskId>,
    pending: Option<Pending>,
    current_text: Option<String>,
    seen_completed: Option<usize>,
    epoch: u64,
}

impl NarrationController {
    #[must_use]
    pub fn new(script: GuideScript, config: &GuideConfig) -> Self {
        Self {
            script,
            speak_explanations: config.speak_explanations,
            state: if config.start_open {
                NarrationState::Idle
            } else {
                NarrationState::Closed
            },
            is_open: config.start_open,
            is_muted: config.start_muted,
            user_interacted: false,
            speaking: None,
            next_token: 0,
            active_task_id: None,
            last_spoken_task_id: None,
            pending: None,
            current_text: None,
            seen_completed: None,
            epoch: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> NarrationState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    #[inline]
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    #[inline]
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    #[inline]
    #[must_use]
    pub fn user_interacted(&self) -> bool {
        self.user_interacted
    }

    #[inline]
    #[must_use]
    pub fn last_spoken_task_id(&self) -> Option<&TaskId> {
        self.last_spoken_task_id.as_ref()
    }

    /// Narration text of the last announcement
    #[inline]
    #[must_use]
    pub fn current_text(&self) -> Option<&str> {
        self.current_text.as_deref()
    }

    /// Whether an announcement is waiting for delivery
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Skip is offered only while a task is active
    #[inline]
    #[must_use]
    pub fn can_skip(&self) -> bool {
        self.active_task_id.is_some()
    }

    #[inline]
    #[must_use]
    pub fn script(&self) -> &GuideScript {
        &self.script
    }

    /// Observe the store's task fields
    ///
    /// Safe to call on every render; only a change of the active task's
    /// identity or a new completion produces commands.
    pub fn observe(&mut self, active: Option<&TaskId>, completed: &[TaskId]) -> Vec<NarrationCommand> {
        let mut cmds = Vec::new();
        self.observe_completions(completed, &mut cmds);

        if active == self.active_task_id.as_ref() {
            return cmds;
        }
        tracing::debug!(from = ?self.active_task_id, to = ?active, "active task changed");
        self.active_task_id = active.cloned();
        self.epoch += 1;
        self.pending = None;

        match active {
            None => {
                if matches!(self.state, NarrationState::Announcing | NarrationState::Silent) {
                    self.transition(NarrationState::Idle);
                }
            }
            Some(id) => {
                self.cancel_speech(&mut cmds);
                self.announce(id, &mut cmds);
            }
        }
        cmds
    }

    /// First user gesture unlocks audio; later gestures are no-ops
    pub fn user_gesture(&mut self) -> Vec<NarrationCommand> {
        if self.user_interacted {
            return Vec::new();
        }
        self.user_interacted = true;
        tracing::debug!("user interaction recorded");
        let mut cmds = Vec::new();
        self.try_deliver(&mut cmds);
        cmds
    }

    pub fn set_muted(&mut self, muted: bool) -> Vec<NarrationCommand> {
        let mut cmds = Vec::new();
        if muted == self.is_muted {
            return cmds;
        }
        self.is_muted = muted;
        if muted {
            self.cancel_speech(&mut cmds);
        } else {
            self.try_deliver(&mut cmds);
        }
        cmds
    }

    pub fn toggle_mute(&mut self) -> Vec<NarrationCommand> {
        self.set_muted(!self.is_muted)
    }

    /// Dismiss the panel: stops speech and invalidates outstanding explanations
    pub fn close(&mut self) -> Vec<NarrationCommand> {
        let mut cmds = Vec::new();
        if self.state == NarrationState::Closed {
            return cmds;
        }
        self.is_open = false;
        self.cancel_speech(&mut cmds);
        self.pending = None;
        self.epoch += 1;
        self.transition(NarrationState::Closed);
        cmds
    }

    /// Reopen the panel; the last announcement is replayed when allowed
    pub fn open(&mut self) -> Vec<NarrationCommand> {
        let mut cmds = Vec::new();
        if self.state != NarrationState::Closed {
            return cmds;
        }
        self.is_open = true;
        self.transition(NarrationState::Silent);

        let announced_still_active = self.active_task_id.is_some()
            && self.active_task_id == self.last_spoken_task_id;
        match self.current_text.clone() {
            Some(text) if announced_still_active => {
                self.pending = Some(Pending {
                    text,
                    kind: SpeechKind::Replay,
                });
                self.transition(NarrationState::Announcing);
                self.try_deliver(&mut cmds);
            }
            _ => self.transition(self.resting_state()),
        }
        cmds
    }

    /// Show the active task's hint (display only)
    ///
    /// The script's hint wins over `task_hint`.
    pub fn show_hint(&mut self, task_hint: Option<&str>) -> Vec<NarrationCommand> {
        let Some(id) = &self.active_task_id else {
            return Vec::new();
        };
        let hint = self
            .script
            .get(id)
            .and_then(|m| m.hint.clone())
            .or_else(|| task_hint.map(str::to_string));
        hint.map(|text| NarrationCommand::Display {
            kind: DisplayKind::Hint,
            text,
        })
        .into_iter()
        .collect()
    }

    /// Speech ended normally or was cancelled elsewhere
    pub fn speech_finished(&mut self, token: SpeechToken) -> Vec<NarrationCommand> {
        if self.speaking != Some(token) {
            tracing::debug!(%token, "stale utterance result discarded");
            return Vec::new();
        }
        self.speaking = None;
        if self.state == NarrationState::Speaking {
            self.transition(self.resting_state());
        }
        Vec::new()
    }

    /// Speech could not be delivered
    pub fn speech_failed(&mut self, token: SpeechToken, reason: &str) -> Vec<NarrationCommand> {
        if self.speaking != Some(token) {
            tracing::debug!(%token, "stale utterance failure discarded");
            return Vec::new();
        }
        tracing::warn!(%token, reason, "narration delivery failed");
        self.speaking = None;
        if self.state == NarrationState::Speaking {
            self.transition(self.resting_state());
        }
        vec![NarrationCommand::Display {
            kind: DisplayKind::Notice,
            text: reason.to_string(),
        }]
    }

    /// Ticket for an explanation request, `None` while closed
    #[must_use]
    pub fn explanation_ticket(&self) -> Option<ExplanationTicket> {
        if self.state == NarrationState::Closed {
            return None;
        }
        Some(ExplanationTicket {
            task_id: self.active_task_id.clone(),
            epoch: self.epoch,
        })
    }

    /// Apply an explanation if its ticket is still current
    pub fn apply_explanation(&mut self, ticket: &ExplanationTicket, text: String) -> Vec<NarrationCommand> {
        if ticket.epoch != self.epoch
            || ticket.task_id != self.active_task_id
            || self.state == NarrationState::Closed
        {
            tracing::debug!(
                ticket_task = ?ticket.task_id,
                active_task = ?self.active_task_id,
                "stale explanation discarded"
            );
            return Vec::new();
        }

        let mut cmds = vec![NarrationCommand::Display {
            kind: DisplayKind::Explanation,
            text: text.clone(),
        }];
        if self.speak_explanations && self.can_play() {
            self.start_speech(text, SpeechKind::Explanation, &mut cmds);
        }
        cmds
    }

    /// Forget task history after the store was reset
    ///
    /// The interaction latch, mute and panel state survive.
    pub fn reset(&mut self) -> Vec<NarrationCommand> {
        let mut cmds = Vec::new();
        self.cancel_speech(&mut cmds);
        self.active_task_id = None;
        self.last_spoken_task_id = None;
        self.pending = None;
        self.current_text = None;
        self.seen_completed = Some(0);
        self.epoch += 1;
        if self.state != NarrationState::Closed {
            self.transition(NarrationState::Idle);
        }
        cmds
    }

    fn observe_completions(&mut self, completed: &[TaskId], cmds: &mut Vec<NarrationCommand>) {
        let Some(seen) = self.seen_completed else {
            // First observation: completions that happened before the guide existed stay quiet.
            self.seen_completed = Some(completed.len());
            return;
        };
        if let Some(new) = completed.get(seen..) {
            for id in new {
                if let Some(text) = self.script.get(id).and_then(|m| m.completion.clone()) {
                    cmds.push(NarrationCommand::Display {
                        kind: DisplayKind::Completion,
                        text,
                    });
                }
            }
        }
        self.seen_completed = Some(completed.len());
    }

    fn announce(&mut self, id: &TaskId, cmds: &mut Vec<NarrationCommand>) {
        let narration = self.script.narration(id).map(str::to_string);
        let already_spoken = self.last_spoken_task_id.as_ref() == Some(id);
        let Some(text) = narration.filter(|_| !already_spoken) else {
            if matches!(self.state, NarrationState::Idle | NarrationState::Announcing) {
                self.transition(NarrationState::Silent);
            }
            return;
        };

        if self.state == NarrationState::Closed {
            tracing::debug!(task = %id, "new task reopens the guide");
            self.is_open = true;
            self.transition(NarrationState::Silent);
        }

        self.last_spoken_task_id = Some(id.clone());
        self.current_text = Some(text.clone());
        if let Some(message) = self.script.get(id) {
            cmds.push(NarrationCommand::Display {
                kind: DisplayKind::Instruction,
                text: message.instruction.clone(),
            });
        }
        self.pending = Some(Pending {
            text,
            kind: SpeechKind::Announcement,
        });
        self.transition(NarrationState::Announcing);
        self.try_deliver(cmds);
    }

    fn can_play(&self) -> bool {
        self.user_interacted && !self.is_muted && self.is_open
    }

    fn try_deliver(&mut self, cmds: &mut Vec<NarrationCommand>) {
        if self.state != NarrationState::Announcing || self.pending.is_none() {
            return;
        }
        if !self.can_play() {
            tracing::debug!(
                user_interacted = self.user_interacted,
                muted = self.is_muted,
                open = self.is_open,
                "announcement deferred"
            );
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.start_speech(pending.text, pending.kind, cmds);
        }
    }

    fn start_speech(&mut self, text: String, kind: SpeechKind, cmds: &mut Vec<NarrationCommand>) {
        self.cancel_speech(cmds);
        self.next_token += 1;
        let token = SpeechToken(self.next_token);
        self.speaking = Some(token);
        self.transition(NarrationState::Speaking);
        cmds.push(NarrationCommand::Speak { token, text, kind });
    }

    fn cancel_speech(&mut self, cmds: &mut Vec<NarrationCommand>) {
        if self.speaking.take().is_none() {
            return;
        }
        cmds.push(NarrationCommand::CancelSpeech);
        if self.state == NarrationState::Speaking {
            self.transition(self.resting_state());
        }
    }

    fn resting_state(&self) -> NarrationState {
        if self.active_task_id.is_some() {
            NarrationState::Silent
        } else {
            NarrationState::Idle
        }
    }

    fn transition(&mut self, to: NarrationState) {
        let from = self.state;
        if from == to {
            return;
        }
        if !is_allowed(from, to) {
            tracing::warn!(%from, %to, "illegal narration transition ignored");
            return;
        }
        tracing::debug!(%from, %to, "narration transition");
        self.state = to;
    }
}
