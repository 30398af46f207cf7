//! In-memory history repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::history::{
    domain::{ScheduleHistoryEntry, ScheduleHistoryId},
    ports::{HistoryRepository, HistoryRepositoryError, HistoryRepositoryResult},
};
use crate::schedule::domain::UnixTimestamp;

/// Thread-safe in-memory history repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryRepository {
    entries: Arc<RwLock<HashMap<ScheduleHistoryId, ScheduleHistoryEntry>>>,
}

impl InMemoryHistoryRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(err: impl std::fmt::Display) -> HistoryRepositoryError {
    HistoryRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn insert(&self, entry: &ScheduleHistoryEntry) -> HistoryRepositoryResult<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(&entry.id()) {
            return Ok(false);
        }
        entries.insert(entry.id(), entry.clone());
        Ok(true)
    }

    async fn find_by_id(
        &self,
        id: ScheduleHistoryId,
    ) -> HistoryRepositoryResult<Option<ScheduleHistoryEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&id).cloned())
    }

    async fn find_by_created_range(
        &self,
        start: UnixTimestamp,
        end: UnixTimestamp,
    ) -> HistoryRepositoryResult<Vec<ScheduleHistoryEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut matching: Vec<ScheduleHistoryEntry> = entries
            .values()
            .filter(|entry| (start..=end).contains(&entry.created_at()))
            .cloned()
            .collect();
        matching.sort_by_key(|entry| std::cmp::Reverse(entry.created_at()));
        Ok(matching)
    }
}
