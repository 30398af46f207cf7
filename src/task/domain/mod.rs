//! Domain model for tasks.
//!
//! A task describes one outbound HTTP call. Its invocation fields are
//! optional at rest and only checked when the task is dispatched.

mod error;
mod ids;
mod task;

pub use error::TaskDomainError;
pub use ids::{TaskId, TaskName};
pub use task::{InvocationTarget, PersistedTaskData, Task, TaskDefinition};
