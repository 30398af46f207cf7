//! Task aggregate root.

use super::{TaskDomainError, TaskId, TaskName};
use crate::dispatch::domain::{HttpMethod, IdentityClientId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    endpoint: Option<String>,
    method: Option<String>,
    payload: Option<Value>,
    identity_client_id: Option<IdentityClientId>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

/// User-editable task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    /// Task name.
    pub name: TaskName,
    /// Target URL.
    pub endpoint: Option<String>,
    /// HTTP verb.
    pub method: Option<String>,
    /// Request body; string leaves are templates.
    pub payload: Option<Value>,
    /// Credential source used to authorise the call.
    pub identity_client_id: Option<IdentityClientId>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted definition.
    pub definition: TaskDefinition,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted modification timestamp.
    pub modified_at: Option<DateTime<Utc>>,
}

/// Validated invocation fields of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationTarget<'a> {
    /// Target URL.
    pub endpoint: &'a str,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Credential source.
    pub identity_client_id: &'a IdentityClientId,
}

impl Task {
    /// Creates a new task.
    #[must_use]
    pub fn new(definition: TaskDefinition, clock: &impl Clock) -> Self {
        Self::from_persisted(PersistedTaskData {
            id: TaskId::new(),
            definition,
            created_at: clock.utc(),
            modified_at: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let TaskDefinition {
            name,
            endpoint,
            method,
            payload,
            identity_client_id,
        } = data.definition;
        Self {
            id: data.id,
            name,
            endpoint: non_blank(endpoint),
            method: non_blank(method),
            payload,
            identity_client_id: identity_client_id.filter(|client| !client.is_empty()),
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the target URL, if configured.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Returns the HTTP verb, if configured.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Returns the payload template.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns the credential source, if configured.
    #[must_use]
    pub const fn identity_client_id(&self) -> Option<&IdentityClientId> {
        self.identity_client_id.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    /// Replaces the user-editable fields.
    pub fn apply_definition(&mut self, definition: TaskDefinition, clock: &impl Clock) {
        let replaced = Self::from_persisted(PersistedTaskData {
            id: self.id,
            definition,
            created_at: self.created_at,
            modified_at: Some(clock.utc()),
        });
        *self = replaced;
    }

    /// Returns the validated fields needed to dispatch the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MissingInvocationField`] when the identity
    /// client, endpoint or method is absent and
    /// [`TaskDomainError::InvalidMethod`] for an unknown verb.
    pub fn invocation_target(&self) -> Result<InvocationTarget<'_>, TaskDomainError> {
        let identity_client_id = self
            .identity_client_id
            .as_ref()
            .ok_or_else(|| self.missing("identity client"))?;
        let endpoint = self.endpoint().ok_or_else(|| self.missing("endpoint"))?;
        let raw_method = self.method().ok_or_else(|| self.missing("method"))?;
        let method =
            HttpMethod::try_from(raw_method).map_err(|_| TaskDomainError::InvalidMethod {
                task_id: self.id,
                method: raw_method.to_owned(),
            })?;
        Ok(InvocationTarget {
            endpoint,
            method,
            identity_client_id,
        })
    }

    const fn missing(&self, field: &'static str) -> TaskDomainError {
        TaskDomainError::MissingInvocationField {
            task_id: self.id,
            field,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
