//! Schedule create, read, update and delete operations.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

use super::CronScheduleEvaluator;
use crate::error::ErrorKind;
use crate::schedule::{
    domain::{
        CronDefinition, NewSchedule, Schedule, ScheduleChanges, ScheduleDomainError, ScheduleId,
        ScheduleName, ScheduleType,
    },
    ports::{ScheduleRepository, ScheduleRepositoryError},
};
use crate::task::domain::TaskId;

/// Request payload for creating a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateScheduleRequest {
    name: String,
    cron: String,
    include_seconds: bool,
    schedule_type: ScheduleType,
    links: Vec<TaskId>,
    is_active: Option<bool>,
}

impl CreateScheduleRequest {
    /// Creates a request for a five-field user schedule with no links.
    #[must_use]
    pub fn new(name: impl Into<String>, cron: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cron: cron.into(),
            include_seconds: false,
            schedule_type: ScheduleType::User,
            links: Vec::new(),
            is_active: None,
        }
    }

    /// Selects the six-field grammar with a leading seconds field.
    #[must_use]
    pub const fn with_seconds(mut self) -> Self {
        self.include_seconds = true;
        self
    }

    /// Sets the schedule type.
    #[must_use]
    pub const fn with_schedule_type(mut self, schedule_type: ScheduleType) -> Self {
        self.schedule_type = schedule_type;
        self
    }

    /// Sets the linked tasks.
    #[must_use]
    pub fn with_links(mut self, links: impl IntoIterator<Item = TaskId>) -> Self {
        self.links = links.into_iter().collect();
        self
    }

    /// Sets the participation flag explicitly.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Request payload for replacing a schedule definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateScheduleRequest {
    name: String,
    cron: String,
    include_seconds: bool,
    links: Vec<TaskId>,
    is_active: Option<bool>,
}

impl UpdateScheduleRequest {
    /// Creates a replacement with a five-field expression and no links.
    #[must_use]
    pub fn new(name: impl Into<String>, cron: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cron: cron.into(),
            include_seconds: false,
            links: Vec::new(),
            is_active: None,
        }
    }

    /// Selects the six-field grammar with a leading seconds field.
    #[must_use]
    pub const fn with_seconds(mut self) -> Self {
        self.include_seconds = true;
        self
    }

    /// Sets the linked tasks.
    #[must_use]
    pub fn with_links(mut self, links: impl IntoIterator<Item = TaskId>) -> Self {
        self.links = links.into_iter().collect();
        self
    }

    /// Sets the participation flag explicitly.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Service-level errors for schedule operations.
#[derive(Debug, Error)]
pub enum ScheduleServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ScheduleDomainError),

    /// The schedule does not exist.
    #[error("schedule not found: {0}")]
    NotFound(ScheduleId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ScheduleRepositoryError),
}

impl ScheduleServiceError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Repository(ScheduleRepositoryError::DuplicateName { .. }) => {
                ErrorKind::Validation
            }
            Self::NotFound(_) | Self::Repository(ScheduleRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(
                ScheduleRepositoryError::VersionConflict { .. }
                | ScheduleRepositoryError::Duplicate(_),
            ) => ErrorKind::Conflict,
            Self::Repository(ScheduleRepositoryError::Persistence(_)) => ErrorKind::Unavailable,
        }
    }
}

/// Result type for schedule service operations.
pub type ScheduleServiceResult<T> = Result<T, ScheduleServiceError>;

/// Schedule catalogue service.
///
/// Every write validates the CRON expression before touching the store.
#[derive(Clone)]
pub struct ScheduleService<R, C>
where
    R: ScheduleRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    evaluator: Arc<CronScheduleEvaluator>,
    clock: Arc<C>,
}

impl<R, C> ScheduleService<R, C>
where
    R: ScheduleRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new schedule service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        evaluator: Arc<CronScheduleEvaluator>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            evaluator,
            clock,
        }
    }

    /// Creates an uninitialized schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::Domain`] when the name or CRON
    /// expression is invalid and
    /// [`ScheduleRepositoryError::DuplicateName`] when the name is already
    /// used within the schedule type.
    pub async fn create(&self, request: CreateScheduleRequest) -> ScheduleServiceResult<Schedule> {
        let name = ScheduleName::new(request.name)?;
        let cron = self.validated_cron(request.cron, request.include_seconds)?;
        if self
            .repository
            .find_by_name(&name, request.schedule_type)
            .await?
            .is_some()
        {
            return Err(ScheduleRepositoryError::DuplicateName {
                name,
                schedule_type: request.schedule_type,
            }
            .into());
        }

        let schedule = Schedule::new(
            NewSchedule {
                name,
                schedule_type: request.schedule_type,
                cron,
                links: request.links,
                is_active: request.is_active,
            },
            &*self.clock,
        );
        let stored = self.repository.insert(&schedule).await?;
        tracing::info!(
            schedule_id = %stored.id(),
            schedule_name = %stored.name(),
            schedule_type = %stored.schedule_type(),
            "schedule created"
        );
        Ok(stored)
    }

    /// Retrieves a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::NotFound`] when the schedule does not
    /// exist.
    pub async fn get(&self, id: ScheduleId) -> ScheduleServiceResult<Schedule> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ScheduleServiceError::NotFound(id))
    }

    /// Returns every stored schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> ScheduleServiceResult<Vec<Schedule>> {
        Ok(self.repository.list_all().await?)
    }

    /// Finds a schedule by name within a schedule type.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::Domain`] for a blank name.
    pub async fn find_by_name(
        &self,
        raw_name: &str,
        schedule_type: ScheduleType,
    ) -> ScheduleServiceResult<Option<Schedule>> {
        let name = ScheduleName::new(raw_name)?;
        Ok(self.repository.find_by_name(&name, schedule_type).await?)
    }

    /// Replaces a schedule definition and resets its trigger state so the
    /// next poll cycle recomputes it.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::NotFound`] when the schedule does not
    /// exist, [`ScheduleServiceError::Domain`] when the new definition is
    /// invalid, and [`ScheduleRepositoryError::VersionConflict`] when the
    /// schedule changed concurrently.
    pub async fn update(
        &self,
        id: ScheduleId,
        request: UpdateScheduleRequest,
    ) -> ScheduleServiceResult<Schedule> {
        let name = ScheduleName::new(request.name)?;
        let cron = self.validated_cron(request.cron, request.include_seconds)?;
        let mut schedule = self.get(id).await?;
        let expected_version = schedule.version();
        schedule.apply_changes(
            ScheduleChanges {
                name,
                cron,
                links: request.links,
                is_active: request.is_active,
            },
            &*self.clock,
        );
        let stored = self.repository.replace(&schedule, expected_version).await?;
        tracing::info!(schedule_id = %stored.id(), "schedule updated");
        Ok(stored)
    }

    /// Deletes a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::NotFound`] when the schedule does not
    /// exist.
    pub async fn delete(&self, id: ScheduleId) -> ScheduleServiceResult<()> {
        if !self.repository.delete(id).await? {
            return Err(ScheduleServiceError::NotFound(id));
        }
        tracing::info!(schedule_id = %id, "schedule deleted");
        Ok(())
    }

    fn validated_cron(
        &self,
        text: String,
        include_seconds: bool,
    ) -> Result<CronDefinition, ScheduleDomainError> {
        let cron = CronDefinition::new(text, include_seconds)?;
        self.evaluator.parse(&cron)?;
        Ok(cron)
    }
}
