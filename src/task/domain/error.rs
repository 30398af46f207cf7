//! Error types for task domain validation.

use super::TaskId;
use thiserror::Error;

/// Errors returned while constructing tasks or resolving their invocation
/// target.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// A field required for dispatch is missing or blank.
    #[error("task {task_id} cannot be dispatched: missing {field}")]
    MissingInvocationField {
        /// Affected task.
        task_id: TaskId,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The HTTP method is not a recognised verb.
    #[error("task {task_id} has unsupported HTTP method '{method}'")]
    InvalidMethod {
        /// Affected task.
        task_id: TaskId,
        /// Configured method.
        method: String,
    },

    /// The payload template could not be rendered.
    #[error("task {task_id} payload template failed to render: {reason}")]
    PayloadTemplate {
        /// Affected task.
        task_id: TaskId,
        /// Renderer message.
        reason: String,
    },
}
