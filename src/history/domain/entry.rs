//! History entries.

use super::ScheduleHistoryId;
use crate::dispatch::domain::InvocationId;
use crate::schedule::domain::{Schedule, ScheduleId, ScheduleName, UnixTimestamp};
use crate::task::domain::{TaskId, TaskName};
use serde::{Deserialize, Serialize};

/// Event key carried by history events.
pub const HISTORY_EVENT_KEY: &str = "SchedulerHistoryApiEvent";

/// One dispatched task within a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTaskHistoryItem {
    /// Dispatched task.
    pub task_id: TaskId,
    /// Task name at dispatch time.
    pub task_name: TaskName,
    /// Correlation identifier of the dispatched event.
    pub invocation_id: InvocationId,
}

/// Immutable record of one schedule invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleHistoryEntry {
    id: ScheduleHistoryId,
    schedule_id: ScheduleId,
    schedule_name: ScheduleName,
    tasks: Vec<ScheduleTaskHistoryItem>,
    trigger_date: UnixTimestamp,
    is_manual_trigger: bool,
    created_at: UnixTimestamp,
}

impl ScheduleHistoryEntry {
    /// Snapshots `schedule` after it was triggered.
    ///
    /// The trigger date is the schedule's last runtime, falling back to
    /// `created_at` for a schedule that was never marked triggered.
    #[must_use]
    pub fn for_schedule(
        schedule: &Schedule,
        tasks: Vec<ScheduleTaskHistoryItem>,
        is_manual_trigger: bool,
        created_at: UnixTimestamp,
    ) -> Self {
        Self {
            id: ScheduleHistoryId::new(),
            schedule_id: schedule.id(),
            schedule_name: schedule.name().clone(),
            tasks,
            trigger_date: schedule.last_runtime().unwrap_or(created_at),
            is_manual_trigger,
            created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> ScheduleHistoryId {
        self.id
    }

    /// Returns the schedule identifier.
    #[must_use]
    pub const fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    /// Returns the schedule name captured at trigger time.
    #[must_use]
    pub const fn schedule_name(&self) -> &ScheduleName {
        &self.schedule_name
    }

    /// Returns the dispatched tasks in link order.
    #[must_use]
    pub fn tasks(&self) -> &[ScheduleTaskHistoryItem] {
        &self.tasks
    }

    /// Returns the runtime that caused the invocation.
    #[must_use]
    pub const fn trigger_date(&self) -> UnixTimestamp {
        self.trigger_date
    }

    /// Returns `true` for manual runs.
    #[must_use]
    pub const fn is_manual_trigger(&self) -> bool {
        self.is_manual_trigger
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> UnixTimestamp {
        self.created_at
    }
}
