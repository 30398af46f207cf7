//! Repository port for schedule history.

use crate::history::domain::{ScheduleHistoryEntry, ScheduleHistoryId};
use crate::schedule::domain::UnixTimestamp;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for history repository operations.
pub type HistoryRepositoryResult<T> = Result<T, HistoryRepositoryError>;

/// Append-only history persistence contract.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Stores an entry.
    ///
    /// Returns `false` when an entry with the same identifier already
    /// exists; the stored entry is left untouched.
    async fn insert(&self, entry: &ScheduleHistoryEntry) -> HistoryRepositoryResult<bool>;

    /// Finds an entry by identifier.
    async fn find_by_id(
        &self,
        id: ScheduleHistoryId,
    ) -> HistoryRepositoryResult<Option<ScheduleHistoryEntry>>;

    /// Returns entries with `start <= created_at <= end`, newest first.
    async fn find_by_created_range(
        &self,
        start: UnixTimestamp,
        end: UnixTimestamp,
    ) -> HistoryRepositoryResult<Vec<ScheduleHistoryEntry>>;
}

/// Errors returned by history repository implementations.
#[derive(Debug, Clone, Error)]
pub enum HistoryRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HistoryRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
