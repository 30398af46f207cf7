//! Error types for schedule domain validation.

use thiserror::Error;

use super::CronError;

/// Errors returned while constructing or mutating schedule values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleDomainError {
    /// The schedule name is empty after trimming.
    #[error("schedule name must not be empty")]
    EmptyScheduleName,

    /// The CRON expression is empty after trimming.
    #[error("CRON expression must not be empty")]
    EmptyCronExpression,

    /// The CRON expression does not parse.
    #[error(transparent)]
    InvalidCron(#[from] CronError),
}

/// Error returned while parsing schedule types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown schedule type: {0}")]
pub struct ParseScheduleTypeError(pub String);
