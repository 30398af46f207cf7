//! In-memory schedule repository for tests and embedding.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::schedule::{
    domain::{Schedule, ScheduleId, ScheduleName, ScheduleType},
    ports::{ScheduleRepository, ScheduleRepositoryError, ScheduleRepositoryResult},
};

/// Thread-safe in-memory schedule repository.
///
/// Counts successful writes and can be told to fail writes for chosen
/// schedules, which lets tests observe side effects of a poll cycle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleRepository {
    state: Arc<RwLock<InMemoryScheduleState>>,
}

#[derive(Debug, Default)]
struct InMemoryScheduleState {
    schedules: HashMap<ScheduleId, Schedule>,
    failing: HashSet<ScheduleId>,
    writes: usize,
}

impl InMemoryScheduleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successful inserts, replaces and deletes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.read().map_or(0, |state| state.writes)
    }

    /// Makes every subsequent replace of `id` fail with a persistence error.
    pub fn fail_writes_for(&self, id: ScheduleId) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(id);
        }
    }

    fn read(&self) -> ScheduleRepositoryResult<RwLockReadGuard<'_, InMemoryScheduleState>> {
        self.state.read().map_err(|err| {
            ScheduleRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ScheduleRepositoryResult<RwLockWriteGuard<'_, InMemoryScheduleState>> {
        self.state.write().map_err(|err| {
            ScheduleRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn name_taken(state: &InMemoryScheduleState, schedule: &Schedule) -> bool {
    state.schedules.values().any(|existing| {
        existing.id() != schedule.id()
            && existing.schedule_type() == schedule.schedule_type()
            && existing.name() == schedule.name()
    })
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn find_by_id(&self, id: ScheduleId) -> ScheduleRepositoryResult<Option<Schedule>> {
        let state = self.read()?;
        Ok(state.schedules.get(&id).cloned())
    }

    async fn list_all(&self) -> ScheduleRepositoryResult<Vec<Schedule>> {
        let state = self.read()?;
        let mut schedules: Vec<Schedule> = state.schedules.values().cloned().collect();
        schedules.sort_by_key(Schedule::created_at);
        Ok(schedules)
    }

    async fn find_by_name(
        &self,
        name: &ScheduleName,
        schedule_type: ScheduleType,
    ) -> ScheduleRepositoryResult<Option<Schedule>> {
        let state = self.read()?;
        Ok(state
            .schedules
            .values()
            .find(|schedule| schedule.schedule_type() == schedule_type && schedule.name() == name)
            .cloned())
    }

    async fn insert(&self, schedule: &Schedule) -> ScheduleRepositoryResult<Schedule> {
        let mut state = self.write()?;
        if state.schedules.contains_key(&schedule.id()) {
            return Err(ScheduleRepositoryError::Duplicate(schedule.id()));
        }
        if name_taken(&state, schedule) {
            return Err(ScheduleRepositoryError::DuplicateName {
                name: schedule.name().clone(),
                schedule_type: schedule.schedule_type(),
            });
        }
        let stored = schedule.clone().with_version(1);
        state.schedules.insert(stored.id(), stored.clone());
        state.writes += 1;
        Ok(stored)
    }

    async fn replace(
        &self,
        schedule: &Schedule,
        expected_version: u64,
    ) -> ScheduleRepositoryResult<Schedule> {
        let mut state = self.write()?;
        if state.failing.contains(&schedule.id()) {
            return Err(ScheduleRepositoryError::persistence(std::io::Error::other(
                format!("write rejected for schedule {}", schedule.id()),
            )));
        }
        let actual = state
            .schedules
            .get(&schedule.id())
            .ok_or(ScheduleRepositoryError::NotFound(schedule.id()))?
            .version();
        if actual != expected_version {
            return Err(ScheduleRepositoryError::VersionConflict {
                id: schedule.id(),
                expected: expected_version,
                actual,
            });
        }
        if name_taken(&state, schedule) {
            return Err(ScheduleRepositoryError::DuplicateName {
                name: schedule.name().clone(),
                schedule_type: schedule.schedule_type(),
            });
        }
        let stored = schedule.clone().with_version(actual + 1);
        state.schedules.insert(stored.id(), stored.clone());
        state.writes += 1;
        Ok(stored)
    }

    async fn delete(&self, id: ScheduleId) -> ScheduleRepositoryResult<bool> {
        let mut state = self.write()?;
        let removed = state.schedules.remove(&id).is_some();
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }
}
