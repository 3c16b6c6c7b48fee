//! Lab Tasks
//!
//! Task lifecycle for guided simulation sessions.
//!
//! # Core Concepts
//!
//! - **Task**: one learning step with an idempotent setup and a completion predicate
//! - **`TaskList`**: ordered, immutable list of tasks with unique ids
//! - **`SimulationStore`**: per-session domain state plus shared task bookkeeping
//! - **`TaskRunner`**: activates, evaluates and skips tasks against a store
//!
//! # Example
//!
//! ```rust,ignore
//! use lab_tasks::domain::chemistry::{self, ChemistryStore};
//! use lab_tasks::TaskRunner;
//!
//! let mut runner = TaskRunner::new(ChemistryStore::new(), chemistry::task_list()?);
//! runner.activate_next()?;
//! let completed = runner.update(|s| s.set_ph_value(7.0))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod domain;
pub mod error;
pub mod runner;
pub mod store;
pub mod task;
pub mod types;

pub use error::{StoreError, TaskError, TaskResult};
pub use runner::{Completion, TaskRunner};
pub use store::{SimulationStore, TaskProgress, TaskTracking};
pub use task::{SetupFn, Task, TaskList, ValidateFn};
pub use types::{Progress, TaskId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving tasks
    pub use crate::error::{StoreError, TaskError, TaskResult};
    pub use crate::runner::{Completion, TaskRunner};
    pub use crate::store::{SimulationStore, TaskTracking};
    pub use crate::task::{Task, TaskList};
    pub use crate::types::{Progress, TaskId};
}
