//! History ingestion and range queries.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::history::{
    domain::{ScheduleHistoryEntry, ScheduleHistoryId},
    ports::{HistoryRepository, HistoryRepositoryError},
};
use crate::schedule::domain::UnixTimestamp;

/// Errors returned by [`ScheduleHistoryService`].
#[derive(Debug, Error)]
pub enum HistoryQueryError {
    /// The entry does not exist.
    #[error("history entry not found: {0}")]
    NotFound(ScheduleHistoryId),

    /// The range end precedes its start.
    #[error("invalid history range: {start} is after {end}")]
    InvalidRange {
        /// Requested start.
        start: UnixTimestamp,
        /// Requested end.
        end: UnixTimestamp,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] HistoryRepositoryError),
}

impl HistoryQueryError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidRange { .. } => ErrorKind::Validation,
            Self::Repository(_) => ErrorKind::Unavailable,
        }
    }
}

/// Persists history entries received from the history endpoint and serves
/// read access by creation date.
#[derive(Clone)]
pub struct ScheduleHistoryService<R, C>
where
    R: HistoryRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ScheduleHistoryService<R, C>
where
    R: HistoryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new history service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Stores an entry. Redelivered entries are accepted and ignored.
    ///
    /// Returns `true` when the entry was new.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryQueryError::Repository`] when the write fails.
    pub async fn ingest(&self, entry: &ScheduleHistoryEntry) -> Result<bool, HistoryQueryError> {
        let inserted = self.repository.insert(entry).await?;
        if inserted {
            tracing::info!(
                history_id = %entry.id(),
                schedule_id = %entry.schedule_id(),
                schedule_name = %entry.schedule_name(),
                trigger_date = %entry.trigger_date(),
                "history entry stored"
            );
        } else {
            tracing::debug!(history_id = %entry.id(), "duplicate history entry ignored");
        }
        Ok(inserted)
    }

    /// Retrieves one entry.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryQueryError::NotFound`] when the entry does not
    /// exist.
    pub async fn get(
        &self,
        id: ScheduleHistoryId,
    ) -> Result<ScheduleHistoryEntry, HistoryQueryError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(HistoryQueryError::NotFound(id))
    }

    /// Returns entries created between `start` and `end` inclusive, newest
    /// first. A missing `end` means now.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryQueryError::InvalidRange`] when `end` precedes
    /// `start`.
    pub async fn find_by_created_range(
        &self,
        start: UnixTimestamp,
        end: Option<UnixTimestamp>,
    ) -> Result<Vec<ScheduleHistoryEntry>, HistoryQueryError> {
        let resolved_end = end.unwrap_or_else(|| UnixTimestamp::now(&*self.clock));
        if resolved_end < start {
            return Err(HistoryQueryError::InvalidRange {
                start,
                end: resolved_end,
            });
        }
        Ok(self
            .repository
            .find_by_created_range(start, resolved_end)
            .await?)
    }
}
