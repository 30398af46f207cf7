//! Schedule aggregate root.

use super::{CronDefinition, RuntimeQueue, ScheduleId, ScheduleName, ScheduleType, UnixTimestamp};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Schedule aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    id: ScheduleId,
    name: ScheduleName,
    schedule_type: ScheduleType,
    cron: CronDefinition,
    last_runtime: Option<UnixTimestamp>,
    next_runtime: Option<UnixTimestamp>,
    queue: RuntimeQueue,
    links: Vec<TaskId>,
    is_active: Option<bool>,
    version: u64,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

/// Parameter object for creating a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    /// Schedule name.
    pub name: ScheduleName,
    /// Owner category; names are unique per type.
    pub schedule_type: ScheduleType,
    /// Trigger definition.
    pub cron: CronDefinition,
    /// Linked task identifiers.
    pub links: Vec<TaskId>,
    /// Participation in polling; `None` counts as active.
    pub is_active: Option<bool>,
}

/// Replacement definition applied by an explicit update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleChanges {
    /// New schedule name.
    pub name: ScheduleName,
    /// New trigger definition.
    pub cron: CronDefinition,
    /// New linked task identifiers.
    pub links: Vec<TaskId>,
    /// New participation flag.
    pub is_active: Option<bool>,
}

/// Parameter object for reconstructing a persisted schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedScheduleData {
    /// Persisted schedule identifier.
    pub id: ScheduleId,
    /// Persisted name.
    pub name: ScheduleName,
    /// Persisted owner category.
    pub schedule_type: ScheduleType,
    /// Persisted trigger definition.
    pub cron: CronDefinition,
    /// Persisted last runtime, if the schedule ever fired.
    pub last_runtime: Option<UnixTimestamp>,
    /// Persisted next runtime; `None` or zero means uninitialized.
    pub next_runtime: Option<UnixTimestamp>,
    /// Persisted occurrence queue.
    pub queue: RuntimeQueue,
    /// Persisted task links.
    pub links: Vec<TaskId>,
    /// Persisted participation flag.
    pub is_active: Option<bool>,
    /// Persisted optimistic concurrency version.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted modification timestamp.
    pub modified_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Creates a new, uninitialized schedule.
    #[must_use]
    pub fn new(data: NewSchedule, clock: &impl Clock) -> Self {
        Self {
            id: ScheduleId::new(),
            name: data.name,
            schedule_type: data.schedule_type,
            cron: data.cron,
            last_runtime: None,
            next_runtime: None,
            queue: RuntimeQueue::empty(),
            links: distinct(data.links),
            is_active: data.is_active,
            version: 0,
            created_at: clock.utc(),
            modified_at: None,
        }
    }

    /// Reconstructs a schedule from persisted storage.
    ///
    /// A stored next runtime that disagrees with the head of the stored
    /// queue is replaced by the queue head.
    #[must_use]
    pub fn from_persisted(data: PersistedScheduleData) -> Self {
        let next_runtime = data.queue.first().or(data.next_runtime);
        Self {
            id: data.id,
            name: data.name,
            schedule_type: data.schedule_type,
            cron: data.cron,
            last_runtime: data.last_runtime,
            next_runtime,
            queue: data.queue,
            links: data.links,
            is_active: data.is_active,
            version: data.version,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Returns the schedule identifier.
    #[must_use]
    pub const fn id(&self) -> ScheduleId {
        self.id
    }

    /// Returns the schedule name.
    #[must_use]
    pub const fn name(&self) -> &ScheduleName {
        &self.name
    }

    /// Returns the owner category.
    #[must_use]
    pub const fn schedule_type(&self) -> ScheduleType {
        self.schedule_type
    }

    /// Returns the trigger definition.
    #[must_use]
    pub const fn cron(&self) -> &CronDefinition {
        &self.cron
    }

    /// Returns the runtime that last fired the schedule.
    #[must_use]
    pub const fn last_runtime(&self) -> Option<UnixTimestamp> {
        self.last_runtime
    }

    /// Returns the next due runtime.
    #[must_use]
    pub const fn next_runtime(&self) -> Option<UnixTimestamp> {
        self.next_runtime
    }

    /// Returns the upcoming-occurrence queue.
    #[must_use]
    pub const fn queue(&self) -> &RuntimeQueue {
        &self.queue
    }

    /// Returns the linked task identifiers in insertion order.
    #[must_use]
    pub fn links(&self) -> &[TaskId] {
        &self.links
    }

    /// Returns the raw participation flag.
    #[must_use]
    pub const fn active_flag(&self) -> Option<bool> {
        self.is_active
    }

    /// Returns `true` unless the schedule was explicitly deactivated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
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

    /// Returns `true` once a non-zero next runtime has been computed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.next_runtime.is_some_and(|next| next.as_secs() != 0)
    }

    /// Returns `true` when the next runtime is set and not after `now`.
    #[must_use]
    pub fn is_due(&self, now: UnixTimestamp) -> bool {
        self.next_runtime
            .is_some_and(|next| next.as_secs() != 0 && now >= next)
    }

    /// Returns seconds until the next runtime; negative when overdue.
    #[must_use]
    pub fn time_remaining(&self, now: UnixTimestamp) -> Option<i64> {
        self.next_runtime.map(|next| now.secs_until(next))
    }

    /// Records that the schedule fired at `now`.
    pub fn mark_triggered(&mut self, now: UnixTimestamp, clock: &impl Clock) {
        self.last_runtime = Some(now);
        self.touch(clock);
    }

    /// Installs a freshly computed queue and moves the next runtime to its
    /// head. An empty queue leaves the schedule uninitialized.
    pub fn arm(&mut self, queue: RuntimeQueue, clock: &impl Clock) {
        self.next_runtime = queue.first();
        self.queue = queue;
        self.touch(clock);
    }

    /// Clears the next runtime and queue so the next cycle recomputes them.
    pub fn reset_trigger_state(&mut self) {
        self.next_runtime = None;
        self.queue = RuntimeQueue::empty();
    }

    /// Replaces the schedule definition and resets its trigger state.
    ///
    /// The last runtime is preserved.
    pub fn apply_changes(&mut self, changes: ScheduleChanges, clock: &impl Clock) {
        self.name = changes.name;
        self.cron = changes.cron;
        self.links = distinct(changes.links);
        self.is_active = changes.is_active;
        self.reset_trigger_state();
        self.touch(clock);
    }

    /// Returns a copy of this schedule carrying `version`.
    ///
    /// Used by stores after a successful write.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.modified_at = Some(clock.utc());
    }
}

fn distinct(links: Vec<TaskId>) -> Vec<TaskId> {
    let mut unique = Vec::with_capacity(links.len());
    for link in links {
        if !unique.contains(&link) {
            unique.push(link);
        }
    }
    unique
}
