//! Core types for the task layer

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable task identifier (e.g. `task-1`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create task id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion progress of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Number of completed tasks
    pub completed: usize,
    /// Number of tasks in the list
    pub total: usize,
}

impl Progress {
    /// All tasks completed
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// Completion ratio in `0.0..=1.0`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed.min(self.total) as f64) / (self.total as f64)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_serializes_as_plain_string() {
        let id = TaskId::from("task-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"task-3\"");
    }

    #[test]
    fn progress_ratio_and_finish() {
        let p = Progress {
            completed: 3,
            total: 6,
        };
        assert!((p.ratio() - 0.5).abs() < f64::EPSILON);
        assert!(!p.is_finished());
        assert_eq!(p.to_string(), "3/6");

        let empty = Progress {
            completed: 0,
            total: 0,
        };
        assert!(!empty.is_finished());
        assert!(empty.ratio().abs() < f64::EPSILON);
    }
}
