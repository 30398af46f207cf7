//! Repository port for schedule persistence and lookup.

use crate::schedule::domain::{Schedule, ScheduleId, ScheduleName, ScheduleType};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for schedule repository operations.
pub type ScheduleRepositoryResult<T> = Result<T, ScheduleRepositoryError>;

/// Schedule persistence contract.
///
/// Writes are versioned: every successful insert or replace returns the
/// stored schedule with its new version, and [`Self::replace`] only succeeds
/// when the stored version still matches the caller's.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Finds a schedule by identifier.
    ///
    /// Returns `None` when the schedule does not exist.
    async fn find_by_id(&self, id: ScheduleId) -> ScheduleRepositoryResult<Option<Schedule>>;

    /// Returns every stored schedule, active or not.
    async fn list_all(&self) -> ScheduleRepositoryResult<Vec<Schedule>>;

    /// Finds a schedule by name within a schedule type.
    async fn find_by_name(
        &self,
        name: &ScheduleName,
        schedule_type: ScheduleType,
    ) -> ScheduleRepositoryResult<Option<Schedule>>;

    /// Stores a new schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::Duplicate`] when the identifier
    /// already exists or [`ScheduleRepositoryError::DuplicateName`] when the
    /// name is taken within the schedule type.
    async fn insert(&self, schedule: &Schedule) -> ScheduleRepositoryResult<Schedule>;

    /// Replaces a stored schedule if its version still equals
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::NotFound`] when the schedule does
    /// not exist or [`ScheduleRepositoryError::VersionConflict`] when another
    /// writer replaced it first.
    async fn replace(
        &self,
        schedule: &Schedule,
        expected_version: u64,
    ) -> ScheduleRepositoryResult<Schedule>;

    /// Deletes a schedule. Returns `false` when nothing was deleted.
    async fn delete(&self, id: ScheduleId) -> ScheduleRepositoryResult<bool>;
}

/// Errors returned by schedule repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ScheduleRepositoryError {
    /// A schedule with the same identifier already exists.
    #[error("duplicate schedule identifier: {0}")]
    Duplicate(ScheduleId),

    /// A schedule with the same name already exists in the schedule type.
    #[error("duplicate {schedule_type} schedule name: {name}")]
    DuplicateName {
        /// Conflicting name.
        name: ScheduleName,
        /// Schedule type scope.
        schedule_type: ScheduleType,
    },

    /// The schedule was not found.
    #[error("schedule not found: {0}")]
    NotFound(ScheduleId),

    /// The stored version moved on since the schedule was read.
    #[error("schedule {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        /// Schedule identifier.
        id: ScheduleId,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ScheduleRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
