//! Task runner
//!
//! The only component that mutates `active_task_id` and `completed_tasks`.
//!
//! # Policy
//!
//! Validation is reactive: [`TaskRunner::update`] applies a setter and evaluates
//! the active task's predicate in the same call, so a flag that holds only for
//! one update (a gas pop, say) is still observed.
//!
//! # Activation is all-or-nothing
//!
//! The store is cloned before setup runs. If setup fails the clone is restored,
//! so neither domain fields nor `active_task_id` reflect the failed activation.

use crate::error::{StoreError, TaskError, TaskResult};
use crate::store::SimulationStore;
use crate::task::{Task, TaskList};
use crate::types::{Progress, TaskId};

/// How a task left the active slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Predicate held
    Validated,
    /// User skipped the step
    Skipped,
}

/// Drives one simulation session's task lifecycle
#[derive(Debug)]
pub struct TaskRunner<S: SimulationStore> {
    store: S,
    tasks: TaskList<S>,
}

impl<S: SimulationStore> TaskRunner<S> {
    /// Create runner over a store and its task list
    #[inline]
    #[must_use]
    pub fn new(store: S, tasks: TaskList<S>) -> Self {
        Self { store, tasks }
    }

    /// Read-only view of the store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the runner, returning the store
    #[inline]
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Tasks in progression order
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[Task<S>] {
        self.tasks.as_slice()
    }

    /// Task list
    #[inline]
    #[must_use]
    pub fn task_list(&self) -> &TaskList<S> {
        &self.tasks
    }

    /// Active task id as stored
    #[inline]
    #[must_use]
    pub fn active_task_id(&self) -> Option<&TaskId> {
        self.store.active_task_id()
    }

    /// Completed task ids in completion order
    #[inline]
    #[must_use]
    pub fn completed_tasks(&self) -> &[TaskId] {
        self.store.completed_tasks()
    }

    /// Active task, or `None` when nothing is active or the id is stale
    #[must_use]
    pub fn active_task(&self) -> Option<&Task<S>> {
        let id = self.store.active_task_id()?;
        let task = self.tasks.get(id);
        if task.is_none() {
            let err = TaskError::StaleTaskReference(id.clone());
            tracing::warn!(domain = self.store.domain(), "{}", err);
        }
        task
    }

    /// First task in list order that has not been completed
    #[must_use]
    pub fn next_task(&self) -> Option<&Task<S>> {
        self.tasks.next_pending(self.store.completed_tasks())
    }

    /// Completion progress
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self
                .store
                .completed_tasks()
                .iter()
                .filter(|id| self.tasks.contains(id))
                .count(),
            total: self.tasks.len(),
        }
    }

    /// Activate a task: run its setup, then mark it active
    ///
    /// # Errors
    /// - `TaskError::UnknownTask` if the id is not in the task list
    /// - `TaskError::Setup` if setup failed (store rolled back)
    pub fn activate(&mut self, id: &TaskId) -> TaskResult<()> {
        let task = self
            .tasks
            .get(id)
            .ok_or_else(|| TaskError::UnknownTask(id.clone()))?;

        let backup = self.store.clone();
        if let Err(source) = task.setup(&mut self.store) {
            self.store = backup;
            tracing::warn!(task = %id, error = %source, "setup failed, store rolled back");
            return Err(TaskError::Setup {
                task_id: id.clone(),
                source,
            });
        }

        self.store.set_active_task(Some(id.clone()));
        tracing::info!(domain = self.store.domain(), task = %id, "task activated");
        Ok(())
    }

    /// Activate the next pending task in list order, if any
    ///
    /// # Errors
    /// Same as [`TaskRunner::activate`].
    pub fn activate_next(&mut self) -> TaskResult<Option<TaskId>> {
        let Some(next) = self.next_task().map(|t| t.id.clone()) else {
            return Ok(None);
        };
        self.activate(&next)?;
        Ok(Some(next))
    }

    /// Evaluate the active task's predicate against the current store
    ///
    /// Returns `true` when the active task completed in this call.
    ///
    /// # Errors
    /// - `TaskError::UnknownTask` if the active id is not in the task list
    pub fn evaluate(&mut self) -> TaskResult<bool> {
        let Some(active) = self.store.active_task_id().cloned() else {
            return Ok(false);
        };
        let task = self
            .tasks
            .get(&active)
            .ok_or_else(|| TaskError::UnknownTask(active.clone()))?;

        if !task.validate(&self.store) {
            return Ok(false);
        }

        self.finish(active, Completion::Validated);
        Ok(true)
    }

    /// Apply a store mutation, then evaluate the active task
    ///
    /// Returns `true` when the mutation completed the active task.
    ///
    /// # Errors
    /// - `TaskError::Store` if the setter failed (no evaluation happens)
    /// - `TaskError::UnknownTask` from evaluation
    pub fn update<F>(&mut self, mutate: F) -> TaskResult<bool>
    where
        F: FnOnce(&mut S) -> Result<(), StoreError>,
    {
        mutate(&mut self.store)?;
        self.evaluate()
    }

    /// Complete the active task without validation
    ///
    /// # Errors
    /// - `TaskError::NotActive` if `id` is not the active task
    pub fn skip(&mut self, id: &TaskId) -> TaskResult<()> {
        if self.store.active_task_id() != Some(id) {
            return Err(TaskError::not_active(
                id.clone(),
                self.store.active_task_id().cloned(),
            ));
        }
        self.finish(id.clone(), Completion::Skipped);
        Ok(())
    }

    /// Reset the store to its initial state, clearing task progress
    pub fn reset(&mut self) {
        self.store.reset();
        tracing::info!(domain = self.store.domain(), "session reset");
    }

    fn finish(&mut self, id: TaskId, how: Completion) {
        let newly_recorded = self.store.complete_task(id.clone());
        tracing::info!(
            domain = self.store.domain(),
            task = %id,
            ?how,
            newly_recorded,
            "task completed"
        );
    }
}
