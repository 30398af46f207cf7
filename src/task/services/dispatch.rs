//! Task dispatch coordination.
//!
//! Turns the task links of triggered schedules into authorised dispatch
//! events. Each distinct task is invoked once per call, each distinct
//! identity client gets one token acquisition, and events are handed to the
//! dispatcher one identity-client group at a time. A group either reaches
//! the dispatcher as a whole or every task in it is reported as failed.

use mockable::Clock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::render_payload;
use crate::dispatch::{
    domain::{AccessToken, DispatchEvent, IdentityClientId, InvocationId},
    ports::{EventDispatchError, EventDispatcher, TokenError, TokenProvider},
};
use crate::error::ErrorKind;
use crate::schedule::domain::UnixTimestamp;
use crate::task::{
    domain::{Task, TaskDomainError, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};

/// A task handed to the dispatcher together with its correlation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    /// Dispatched task.
    pub task: Task,
    /// Invocation identifier carried by the dispatched event.
    pub invocation_id: InvocationId,
}

/// Why a task was not dispatched.
#[derive(Debug, Clone, Error)]
pub enum TaskFailureReason {
    /// The linked task no longer exists.
    #[error("task does not exist")]
    NotFound,

    /// The task is missing invocation fields or its payload failed to
    /// render.
    #[error(transparent)]
    Configuration(TaskDomainError),

    /// No token could be obtained for the task's identity client.
    #[error(transparent)]
    Credential(TokenError),

    /// The dispatcher rejected the task's identity-client group.
    #[error(transparent)]
    Dispatch(EventDispatchError),

    /// Cancellation was requested before the task's group was sent.
    #[error("dispatch cancelled")]
    Cancelled,
}

impl TaskFailureReason {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Configuration(_) => ErrorKind::Validation,
            Self::Credential(_) => ErrorKind::CredentialResolution,
            Self::Dispatch(_) => ErrorKind::DispatchBatch,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// A task that was not dispatched.
#[derive(Debug, Clone)]
pub struct TaskDispatchFailure {
    /// Affected task.
    pub task_id: TaskId,
    /// Failure cause.
    pub reason: TaskFailureReason,
}

/// Outcome of one [`TaskDispatchCoordinator::execute_tasks`] call.
#[derive(Debug, Clone, Default)]
pub struct TaskDispatchReport {
    /// Tasks accepted by the dispatcher.
    pub dispatched: Vec<TaskInvocation>,
    /// Tasks that were not dispatched.
    pub failures: Vec<TaskDispatchFailure>,
}

impl TaskDispatchReport {
    /// Returns the invocation recorded for `task_id`, if it was dispatched.
    #[must_use]
    pub fn invocation_for(&self, task_id: TaskId) -> Option<&TaskInvocation> {
        self.dispatched
            .iter()
            .find(|invocation| invocation.task.id() == task_id)
    }

    /// Returns `true` when nothing was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dispatched.is_empty() && self.failures.is_empty()
    }

    fn fail(&mut self, task_id: TaskId, reason: TaskFailureReason) {
        tracing::error!(
            task_id = %task_id,
            error = %reason,
            kind = reason.kind().as_str(),
            "task not dispatched"
        );
        self.failures.push(TaskDispatchFailure { task_id, reason });
    }
}

/// Errors that prevent any task in a call from being dispatched.
#[derive(Debug, Error)]
pub enum TaskDispatchError {
    /// The task lookup failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl TaskDispatchError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(_) => ErrorKind::Unavailable,
        }
    }
}

struct PreparedTask {
    task: Task,
    event: DispatchEvent,
}

/// Resolves tasks and credentials and emits dispatch events.
#[derive(Clone)]
pub struct TaskDispatchCoordinator<R, T, D, C>
where
    R: TaskRepository,
    T: TokenProvider,
    D: EventDispatcher,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    tokens: Arc<T>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
}

impl<R, T, D, C> TaskDispatchCoordinator<R, T, D, C>
where
    R: TaskRepository,
    T: TokenProvider,
    D: EventDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a new coordinator.
    #[must_use]
    pub const fn new(tasks: Arc<R>, tokens: Arc<T>, dispatcher: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            tokens,
            dispatcher,
            clock,
        }
    }

    /// Dispatches each distinct task in `task_ids` once.
    ///
    /// Per-task problems (unknown task, missing configuration, credential
    /// failure, rejected group, cancellation) are reported in the returned
    /// [`TaskDispatchReport`] and never stop other groups.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDispatchError`] only when the tasks cannot be loaded.
    pub async fn execute_tasks(
        &self,
        task_ids: &[TaskId],
        cancellation: &CancellationToken,
    ) -> Result<TaskDispatchReport, TaskDispatchError> {
        let mut report = TaskDispatchReport::default();
        let distinct = distinct_ids(task_ids);
        if distinct.is_empty() {
            return Ok(report);
        }

        let mut loaded: HashMap<TaskId, Task> = self
            .tasks
            .find_by_ids(&distinct)
            .await?
            .into_iter()
            .map(|task| (task.id(), task))
            .collect();

        let mut groups: BTreeMap<IdentityClientId, Vec<Task>> = BTreeMap::new();
        for task_id in distinct {
            let Some(task) = loaded.remove(&task_id) else {
                report.fail(task_id, TaskFailureReason::NotFound);
                continue;
            };
            match task.invocation_target() {
                Ok(target) => {
                    let client = target.identity_client_id.clone();
                    groups.entry(client).or_default().push(task);
                }
                Err(error) => report.fail(task_id, TaskFailureReason::Configuration(error)),
            }
        }

        let clients: Vec<IdentityClientId> = groups.keys().cloned().collect();
        let mut tokens = self.tokens.get_tokens_for_clients(&clients).await;

        for (client, group) in groups {
            let token = match tokens.remove(&client) {
                Some(Ok(token)) => token,
                Some(Err(error)) => {
                    fail_group(&mut report, &group, &TaskFailureReason::Credential(error));
                    continue;
                }
                None => {
                    let error = TokenError::UnknownClient(client.clone());
                    fail_group(&mut report, &group, &TaskFailureReason::Credential(error));
                    continue;
                }
            };
            if cancellation.is_cancelled() {
                fail_group(&mut report, &group, &TaskFailureReason::Cancelled);
                continue;
            }
            self.dispatch_group(&client, &token, group, &mut report)
                .await;
        }

        tracing::info!(
            dispatched = report.dispatched.len(),
            failed = report.failures.len(),
            "task dispatch finished"
        );
        Ok(report)
    }

    async fn dispatch_group(
        &self,
        client: &IdentityClientId,
        token: &AccessToken,
        group: Vec<Task>,
        report: &mut TaskDispatchReport,
    ) {
        let dispatched_at = UnixTimestamp::now(&*self.clock);
        let mut prepared = Vec::with_capacity(group.len());
        for task in group {
            match prepare(task, token, dispatched_at) {
                Ok(ready) => prepared.push(ready),
                Err((task_id, error)) => {
                    report.fail(task_id, TaskFailureReason::Configuration(error));
                }
            }
        }
        if prepared.is_empty() {
            return;
        }

        let events = prepared.iter().map(|ready| ready.event.clone()).collect();
        match self.dispatcher.dispatch_many(events, client).await {
            Ok(()) => {
                for ready in prepared {
                    tracing::debug!(
                        task_id = %ready.task.id(),
                        identity_client_id = %client,
                        invocation_id = %ready.event.invocation_id,
                        "task dispatched"
                    );
                    report.dispatched.push(TaskInvocation {
                        invocation_id: ready.event.invocation_id,
                        task: ready.task,
                    });
                }
            }
            Err(error) => {
                tracing::error!(
                    identity_client_id = %client,
                    error = %error,
                    "dispatch group rejected"
                );
                for ready in prepared {
                    report.fail(ready.task.id(), TaskFailureReason::Dispatch(error.clone()));
                }
            }
        }
    }
}

fn prepare(
    task: Task,
    token: &AccessToken,
    dispatched_at: UnixTimestamp,
) -> Result<PreparedTask, (TaskId, TaskDomainError)> {
    let invocation_id = InvocationId::new();
    let event = {
        let target = task
            .invocation_target()
            .map_err(|error| (task.id(), error))?;
        let payload = render_payload(&task, invocation_id, dispatched_at)
            .map_err(|error| (task.id(), error))?;
        DispatchEvent::new(
            target.endpoint,
            target.method,
            payload,
            task.id().to_string(),
            invocation_id,
        )
        .with_bearer_token(token)
    };
    Ok(PreparedTask { task, event })
}

fn fail_group(report: &mut TaskDispatchReport, group: &[Task], reason: &TaskFailureReason) {
    if let TaskFailureReason::Credential(error) = reason {
        tracing::error!(
            identity_client_id = %error.client_id(),
            tasks = group.len(),
            error = %error,
            "token acquisition failed"
        );
    }
    for task in group {
        report.fail(task.id(), reason.clone());
    }
}

fn distinct_ids(task_ids: &[TaskId]) -> Vec<TaskId> {
    let mut seen = HashSet::with_capacity(task_ids.len());
    task_ids
        .iter()
        .copied()
        .filter(|task_id| seen.insert(*task_id))
        .collect()
}
