//! Simulation store surface shared by every domain
//!
//! Each domain store embeds a [`TaskProgress`] and implements [`TaskTracking`],
//! which gives all stores the same task-related surface:
//! - `active_task_id` / `set_active_task`
//! - `completed_tasks` / `complete_task`
//!
//! Domain fields stay private to the store and change only through its setters.

use crate::types::TaskId;
use serde::{Deserialize, Serialize};

/// Shared task bookkeeping embedded in every store
///
/// `completed` is append-only and holds each id at most once, in completion order.
/// Completing a task always clears the active task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    active_task_id: Option<TaskId>,
    completed_tasks: Vec<TaskId>,
}

impl TaskProgress {
    /// Create empty progress
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active task
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&TaskId> {
        self.active_task_id.as_ref()
    }

    /// Completed tasks in completion order
    #[inline]
    #[must_use]
    pub fn completed(&self) -> &[TaskId] {
        &self.completed_tasks
    }

    /// Check whether a task was completed
    #[inline]
    #[must_use]
    pub fn is_completed(&self, id: &TaskId) -> bool {
        self.completed_tasks.contains(id)
    }

    /// Set or clear the active task
    #[inline]
    pub fn set_active(&mut self, id: Option<TaskId>) {
        self.active_task_id = id;
    }

    /// Record completion and clear the active task
    ///
    /// Returns `false` when the id was already recorded.
    pub fn complete(&mut self, id: TaskId) -> bool {
        self.active_task_id = None;
        if self.completed_tasks.contains(&id) {
            return false;
        }
        self.completed_tasks.push(id);
        true
    }
}

/// Task-related store surface
pub trait TaskTracking {
    /// Shared task bookkeeping
    fn progress(&self) -> &TaskProgress;

    /// Mutable task bookkeeping
    fn progress_mut(&mut self) -> &mut TaskProgress;

    /// Currently active task id
    fn active_task_id(&self) -> Option<&TaskId> {
        self.progress().active()
    }

    /// Completed task ids in completion order
    fn completed_tasks(&self) -> &[TaskId] {
        self.progress().completed()
    }

    /// Set or clear the active task
    fn set_active_task(&mut self, id: Option<TaskId>) {
        self.progress_mut().set_active(id);
    }

    /// Record completion of a task (idempotent) and clear the active task
    fn complete_task(&mut self, id: TaskId) -> bool {
        self.progress_mut().complete(id)
    }
}

/// A per-session simulation store
///
/// Stores are plain values: cloning one gives an independent copy, which the
/// runner uses to roll back a failed setup.
pub trait SimulationStore: TaskTracking + Clone + Serialize + Send + 'static {
    /// Short domain name (e.g. `chemistry`)
    fn domain(&self) -> &'static str;

    /// Restore the store's initial state, including task bookkeeping
    fn reset(&mut self);

    /// Full state snapshot for explanation requests
    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_clears_active_and_deduplicates() {
        let mut progress = TaskProgress::new();
        progress.set_active(Some(TaskId::from("task-1")));

        assert!(progress.complete(TaskId::from("task-1")));
        assert!(progress.active().is_none());

        progress.set_active(Some(TaskId::from("task-1")));
        assert!(!progress.complete(TaskId::from("task-1")));
        assert!(progress.active().is_none());
        assert_eq!(progress.completed(), &[TaskId::from("task-1")]);
    }

    #[test]
    fn completion_order_is_preserved() {
        let mut progress = TaskProgress::new();
        progress.complete(TaskId::from("task-3"));
        progress.complete(TaskId::from("task-1"));
        assert_eq!(
            progress.completed(),
            &[TaskId::from("task-3"), TaskId::from("task-1")]
        );
        assert!(progress.is_completed(&TaskId::from("task-1")));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut progress = TaskProgress::new();
        progress.set_active(Some(TaskId::from("task-2")));
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["activeTaskId"], "task-2");
        assert!(value["completedTasks"].as_array().unwrap().is_empty());
    }
}
