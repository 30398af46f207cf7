//! History recording for triggered schedules.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SchedulerSettings;
use crate::dispatch::{
    domain::{DispatchEvent, HttpMethod, IdentityClientId, InvocationId},
    ports::{EventDispatchError, EventDispatcher, TokenError, TokenProvider},
};
use crate::error::ErrorKind;
use crate::history::domain::{HISTORY_EVENT_KEY, ScheduleHistoryEntry, ScheduleTaskHistoryItem};
use crate::schedule::domain::{TriggeredSchedule, UnixTimestamp};
use crate::task::services::TaskDispatchReport;

/// Errors raised while recording history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// No token could be obtained for the history identity client.
    #[error(transparent)]
    Credential(#[from] TokenError),

    /// An entry could not be serialised into an event body.
    #[error("failed to encode history entry: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The dispatcher rejected the history events.
    #[error(transparent)]
    Dispatch(#[from] EventDispatchError),
}

impl HistoryError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Credential(_) => ErrorKind::CredentialResolution,
            Self::Encoding(_) => ErrorKind::Unavailable,
            Self::Dispatch(_) => ErrorKind::DispatchBatch,
        }
    }
}

/// Builds one history entry per triggered schedule and sends the entries to
/// the history endpoint through the event dispatcher.
#[derive(Clone)]
pub struct HistoryRecorder<T, D, C>
where
    T: TokenProvider,
    D: EventDispatcher,
    C: Clock + Send + Sync,
{
    tokens: Arc<T>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
    endpoint: String,
    identity_client_id: IdentityClientId,
}

impl<T, D, C> HistoryRecorder<T, D, C>
where
    T: TokenProvider,
    D: EventDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a recorder targeting the configured history endpoint.
    #[must_use]
    pub fn new(
        tokens: Arc<T>,
        dispatcher: Arc<D>,
        clock: Arc<C>,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            tokens,
            dispatcher,
            clock,
            endpoint: settings.history_endpoint.clone(),
            identity_client_id: settings.history_identity_client_id.clone(),
        }
    }

    /// Joins each triggered schedule's links against the dispatch report.
    ///
    /// Linked tasks without an invocation in `report` are left out of the
    /// entry.
    #[must_use]
    pub fn build_entries(
        &self,
        triggered: &[TriggeredSchedule],
        report: &TaskDispatchReport,
    ) -> Vec<ScheduleHistoryEntry> {
        let created_at = UnixTimestamp::now(&*self.clock);
        triggered
            .iter()
            .map(|item| {
                let tasks = item
                    .schedule()
                    .links()
                    .iter()
                    .filter_map(|task_id| report.invocation_for(*task_id))
                    .map(|invocation| ScheduleTaskHistoryItem {
                        task_id: invocation.task.id(),
                        task_name: invocation.task.name().clone(),
                        invocation_id: invocation.invocation_id,
                    })
                    .collect();
                ScheduleHistoryEntry::for_schedule(
                    item.schedule(),
                    tasks,
                    item.is_manual(),
                    created_at,
                )
            })
            .collect()
    }

    /// Records history for `triggered` and returns the sent entries.
    ///
    /// Recording is not cancellable: the schedules have already fired, and
    /// their audit trail must follow.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when the history token cannot be obtained,
    /// an entry cannot be encoded, or the dispatcher rejects the events.
    /// Task dispatch is never affected.
    pub async fn record(
        &self,
        triggered: &[TriggeredSchedule],
        report: &TaskDispatchReport,
    ) -> Result<Vec<ScheduleHistoryEntry>, HistoryError> {
        if triggered.is_empty() {
            return Ok(Vec::new());
        }
        let entries = self.build_entries(triggered, report);
        let token = self.tokens.get_token(&self.identity_client_id).await?;

        let mut events = Vec::with_capacity(entries.len());
        for entry in &entries {
            let body = serde_json::to_value(entry)?;
            events.push(
                DispatchEvent::new(
                    self.endpoint.as_str(),
                    HttpMethod::Post,
                    Some(body),
                    HISTORY_EVENT_KEY,
                    InvocationId::new(),
                )
                .with_bearer_token(&token),
            );
        }

        self.dispatcher
            .dispatch_many(events, &self.identity_client_id)
            .await?;

        for entry in &entries {
            tracing::info!(
                schedule_id = %entry.schedule_id(),
                schedule_name = %entry.schedule_name(),
                trigger_date = %entry.trigger_date(),
                tasks = entry.tasks().len(),
                manual = entry.is_manual_trigger(),
                "history entry sent"
            );
        }
        Ok(entries)
    }
}
