//! Narration state machine

use std::fmt;

/// Narration state of a guide session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NarrationState {
    /// No active task
    Idle,
    /// Task announced, speech pending on gesture/mute/panel
    Announcing,
    /// Audio in flight
    Speaking,
    /// Finished, cancelled or muted
    Silent,
    /// Panel dismissed by the user
    Closed,
}

impl NarrationState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Announcing => "announcing",
            Self::Speaking => "speaking",
            Self::Silent => "silent",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for NarrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: NarrationState) -> &'static [NarrationState] {
    use NarrationState::{Announcing, Closed, Idle, Silent, Speaking};
    match from {
        Idle => &[Announcing, Speaking, Silent, Closed],
        Announcing => &[Speaking, Silent, Idle, Closed],
        Speaking => &[Silent, Idle, Closed],
        Silent => &[Announcing, Speaking, Idle, Closed],
        Closed => &[Silent],
    }
}

/// Check a single-step transition
#[must_use]
pub fn is_allowed(from: NarrationState, to: NarrationState) -> bool {
    allowed_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use NarrationState::*;

    #[test]
    fn closed_only_reopens_to_silent() {
        assert_eq!(allowed_transitions(Closed), &[Silent]);
        assert!(!is_allowed(Closed, Speaking));
    }

    #[test]
    fn every_state_can_be_closed() {
        for state in [Idle, Announcing, Speaking, Silent] {
            assert!(is_allowed(state, Closed), "{state}");
        }
    }

    #[test]
    fn speech_starts_only_from_rest_or_announcement() {
        assert!(is_allowed(Announcing, Speaking));
        assert!(is_allowed(Silent, Speaking));
        assert!(!is_allowed(Speaking, Announcing));
    }
}
