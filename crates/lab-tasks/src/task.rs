//! Task definitions and ordered task lists
//!
//! A [`Task`] is pure data plus two functions:
//! - `setup`: idempotent reset of the store to the task's starting configuration
//! - `validate`: side-effect free completion predicate over the store
//!
//! Predicates are caller-supplied and kept exactly as configured.

use crate::error::{StoreError, TaskError};
use crate::types::TaskId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Setup procedure of a task
pub type SetupFn<S> = Arc<dyn Fn(&mut S) -> Result<(), StoreError> + Send + Sync>;

/// Completion predicate of a task
pub type ValidateFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// One learning step
pub struct Task<S> {
    /// Unique, stable id
    pub id: TaskId,
    /// Short title
    pub title: String,
    /// One-sentence description
    pub description: String,
    /// Step-by-step instructions
    pub instructions: Vec<String>,
    /// Optional hint
    pub hint: Option<String>,
    /// Apparatus configuration this task targets
    pub experiment_mode: String,
    setup: SetupFn<S>,
    validate: ValidateFn<S>,
}

impl<S> Task<S> {
    /// Create task with a no-op setup and a predicate that never holds
    #[must_use]
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            instructions: Vec::new(),
            hint: None,
            experiment_mode: String::new(),
            setup: Arc::new(|_| Ok(())),
            validate: Arc::new(|_| false),
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With instructions
    #[must_use]
    pub fn with_instructions<I, T>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.instructions = instructions.into_iter().map(Into::into).collect();
        self
    }

    /// With hint
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// With experiment mode tag
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.experiment_mode = mode.into();
        self
    }

    /// With setup procedure
    #[must_use]
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut S) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        self.setup = Arc::new(setup);
        self
    }

    /// With completion predicate
    #[must_use]
    pub fn with_validation<F>(mut self, validate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.validate = Arc::new(validate);
        self
    }

    /// Run the setup procedure against a store
    ///
    /// # Errors
    /// Propagates the first setter failure.
    #[inline]
    pub fn setup(&self, store: &mut S) -> Result<(), StoreError> {
        (self.setup)(store)
    }

    /// Evaluate the completion predicate
    #[inline]
    #[must_use]
    pub fn validate(&self, state: &S) -> bool {
        (self.validate)(state)
    }

    /// Instructions joined into one paragraph
    #[must_use]
    pub fn instruction_text(&self) -> String {
        self.instructions.join(" ")
    }
}

impl<S> Clone for Task<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            instructions: self.instructions.clone(),
            hint: self.hint.clone(),
            experiment_mode: self.experiment_mode.clone(),
            setup: Arc::clone(&self.setup),
            validate: Arc::clone(&self.validate),
        }
    }
}

impl<S> fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("experiment_mode", &self.experiment_mode)
            .finish_non_exhaustive()
    }
}

/// Ordered task list with unique ids
///
/// Order defines default progression. Immutable once built.
pub struct TaskList<S> {
    tasks: Vec<Task<S>>,
}

impl<S> TaskList<S> {
    /// Build list, rejecting duplicate ids
    ///
    /// # Errors
    /// - `TaskError::DuplicateTask` if two tasks share an id
    pub fn new(tasks: Vec<Task<S>>) -> Result<Self, TaskError> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id.clone()) {
                return Err(TaskError::DuplicateTask(task.id.clone()));
            }
        }
        Ok(Self { tasks })
    }

    /// Look up task by id
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task<S>> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Tasks in progression order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Task<S>] {
        &self.tasks
    }

    /// First task in list order not contained in `completed`
    #[must_use]
    pub fn next_pending(&self, completed: &[TaskId]) -> Option<&Task<S>> {
        self.tasks.iter().find(|t| !completed.contains(&t.id))
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if list is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<S> Clone for TaskList<S> {
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
        }
    }
}

impl<S> fmt::Debug for TaskList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tasks.iter().map(|t| &t.id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: i32,
    }

    #[test]
    fn builder_sets_fields() {
        let task: Task<Counter> = Task::new("task-1", "Count")
            .with_description("Count to three")
            .with_instructions(["Press plus", "Press plus again"])
            .with_hint("Three presses")
            .with_mode("counting");

        assert_eq!(task.id.as_str(), "task-1");
        assert_eq!(task.instruction_text(), "Press plus Press plus again");
        assert_eq!(task.hint.as_deref(), Some("Three presses"));
        assert_eq!(task.experiment_mode, "counting");
    }

    #[test]
    fn setup_and_validate_use_configured_functions() {
        let task: Task<Counter> = Task::new("task-1", "Count")
            .with_setup(|c: &mut Counter| {
                c.value = 0;
                Ok(())
            })
            .with_validation(|c: &Counter| c.value == 3);

        let mut counter = Counter { value: 9 };
        task.setup(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
        assert!(!task.validate(&counter));
        counter.value = 3;
        assert!(task.validate(&counter));
    }

    #[test]
    fn default_predicate_never_holds() {
        let task: Task<Counter> = Task::new("task-1", "Count");
        assert!(!task.validate(&Counter::default()));
    }

    #[test]
    fn task_list_rejects_duplicates() {
        let result = TaskList::<Counter>::new(vec![
            Task::new("task-1", "A"),
            Task::new("task-2", "B"),
            Task::new("task-1", "C"),
        ]);
        assert!(matches!(result, Err(TaskError::DuplicateTask(id)) if id.as_str() == "task-1"));
    }

    #[test]
    fn next_pending_follows_list_order() {
        let list = TaskList::<Counter>::new(vec![
            Task::new("task-1", "A"),
            Task::new("task-2", "B"),
            Task::new("task-3", "C"),
        ])
        .unwrap();

        let next = list.next_pending(&[TaskId::from("task-1"), TaskId::from("task-3")]);
        assert_eq!(next.map(|t| t.id.as_str()), Some("task-2"));
        assert!(list
            .next_pending(&[
                TaskId::from("task-1"),
                TaskId::from("task-2"),
                TaskId::from("task-3")
            ])
            .is_none());
    }
}
