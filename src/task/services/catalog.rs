//! Task create, read, update and delete operations.

use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::domain::IdentityClientId;
use crate::error::ErrorKind;
use crate::task::{
    domain::{Task, TaskDefinition, TaskDomainError, TaskId, TaskName},
    ports::{TaskRepository, TaskRepositoryError},
};

/// Request payload for creating or replacing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    name: String,
    endpoint: Option<String>,
    method: Option<String>,
    payload: Option<Value>,
    identity_client_id: Option<String>,
}

impl TaskRequest {
    /// Creates a request with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            method: None,
            payload: None,
            identity_client_id: None,
        }
    }

    /// Sets the target endpoint and HTTP verb.
    #[must_use]
    pub fn with_request(mut self, method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the payload template.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the identity client used to authorise the call.
    #[must_use]
    pub fn with_identity_client(mut self, identity_client_id: impl Into<String>) -> Self {
        self.identity_client_id = Some(identity_client_id.into());
        self
    }

    fn into_definition(self) -> Result<TaskDefinition, TaskDomainError> {
        Ok(TaskDefinition {
            name: TaskName::new(self.name)?,
            endpoint: self.endpoint,
            method: self.method,
            payload: self.payload,
            identity_client_id: self.identity_client_id.map(IdentityClientId::new),
        })
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl TaskServiceError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(TaskRepositoryError::Duplicate(_)) => ErrorKind::Conflict,
            Self::Repository(TaskRepositoryError::Persistence(_)) => ErrorKind::Unavailable,
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task catalogue service.
///
/// Deleting a task leaves schedule links in place; dangling links are
/// reported when the schedule next dispatches.
#[derive(Clone)]
pub struct TaskService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for a blank name.
    pub async fn create(&self, request: TaskRequest) -> TaskServiceResult<Task> {
        let task = Task::new(request.into_definition()?, &*self.clock);
        self.repository.insert(&task).await?;
        tracing::info!(task_id = %task.id(), task_name = %task.name(), "task created");
        Ok(task)
    }

    /// Retrieves a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn get(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// Returns every stored task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repository.list_all().await?)
    }

    /// Replaces a task definition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist
    /// and [`TaskServiceError::Domain`] for a blank name.
    pub async fn update(&self, id: TaskId, request: TaskRequest) -> TaskServiceResult<Task> {
        let definition = request.into_definition()?;
        let mut task = self.get(id).await?;
        task.apply_definition(definition, &*self.clock);
        self.repository.replace(&task).await?;
        tracing::info!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<()> {
        if !self.repository.delete(id).await? {
            return Err(TaskServiceError::NotFound(id));
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }
}
