//! Transient wrapper for schedules fired in one cycle.

use super::Schedule;

/// How a schedule came to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerOrigin {
    /// Fired by the poll cycle because its next runtime elapsed.
    Poll,
    /// Fired on demand through `run_schedule`.
    Manual,
}

/// Schedule that fired in the current poll cycle or manual run.
///
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredSchedule {
    schedule: Schedule,
    origin: TriggerOrigin,
}

impl TriggeredSchedule {
    /// Wraps a schedule fired by the poll cycle.
    #[must_use]
    pub const fn polled(schedule: Schedule) -> Self {
        Self {
            schedule,
            origin: TriggerOrigin::Poll,
        }
    }

    /// Wraps a schedule fired on demand.
    #[must_use]
    pub const fn manual(schedule: Schedule) -> Self {
        Self {
            schedule,
            origin: TriggerOrigin::Manual,
        }
    }

    /// Returns the schedule as persisted after firing.
    #[must_use]
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Returns the trigger origin.
    #[must_use]
    pub const fn origin(&self) -> TriggerOrigin {
        self.origin
    }

    /// Returns `true` for on-demand runs.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self.origin, TriggerOrigin::Manual)
    }

    /// Consumes the wrapper and returns the schedule.
    #[must_use]
    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }
}
