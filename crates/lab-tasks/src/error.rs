//! Error types for the task layer
//!
//! Provides error handling for:
//! - Task list construction (duplicate ids)
//! - Task activation, evaluation and skipping
//! - Store setter failures (including those raised inside setup procedures)

use crate::types::TaskId;

/// Errors raised by simulation store setters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Value outside the range accepted by the setter
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Optical element (or similar keyed entity) not present
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// Keyed entity already present
    #[error("duplicate element: {0}")]
    DuplicateElement(String),

    /// Setter refused the update for a domain reason
    #[error("invalid update: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Create out-of-range error for a field
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }
}

/// Errors raised by the task runner
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// Referenced task id is not part of the task list
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// Task list contains the same id twice
    #[error("duplicate task id in task list: {0}")]
    DuplicateTask(TaskId),

    /// Operation requires the given task to be the active one
    #[error("task {requested} is not active (active: {})", .active.as_ref().map_or("none", TaskId::as_str))]
    NotActive {
        requested: TaskId,
        active: Option<TaskId>,
    },

    /// Store references a task id that is no longer in the task list
    #[error("stale task reference: {0}")]
    StaleTaskReference(TaskId),

    /// Setup procedure failed; the store was rolled back
    #[error("setup of task {task_id} failed: {source}")]
    Setup {
        task_id: TaskId,
        #[source]
        source: StoreError,
    },

    /// Setter invoked through the runner failed
    #[error("store update failed: {0}")]
    Store(#[from] StoreError),
}

impl TaskError {
    /// Create not-active error
    pub fn not_active(requested: TaskId, active: Option<TaskId>) -> Self {
        Self::NotActive { requested, active }
    }

    /// Check if error is a programmer error that should fail fast
    #[inline]
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::UnknownTask(_) | Self::DuplicateTask(_))
    }
}

/// Result type alias for task operations
pub type TaskResult<T> = Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_active_display_without_active() {
        let err = TaskError::not_active(TaskId::from("task-2"), None);
        assert_eq!(err.to_string(), "task task-2 is not active (active: none)");
    }

    #[test]
    fn not_active_display_with_active() {
        let err = TaskError::not_active(TaskId::from("task-2"), Some(TaskId::from("task-1")));
        assert!(err.to_string().ends_with("(active: task-1)"));
    }

    #[test]
    fn store_error_converts() {
        let err: TaskError = StoreError::UnknownElement("lens-1".into()).into();
        assert!(matches!(err, TaskError::Store(StoreError::UnknownElement(_))));
        assert!(!err.is_programmer_error());
    }

    #[test]
    fn out_of_range_display() {
        let err = StoreError::out_of_range("ph", 15.0, 0.0, 14.0);
        assert_eq!(err.to_string(), "ph out of range: 15 (expected 0..=14)");
    }
}
