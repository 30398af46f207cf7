//! Poll cycle and manual run reports.

use std::time::Duration;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::feature::domain::FeatureEvaluationResult;
use crate::history::{domain::ScheduleHistoryEntry, services::HistoryError};
use crate::schedule::{
    domain::{Schedule, ScheduleId, ScheduleName, TriggeredSchedule},
    services::TriggerError,
};
use crate::task::services::TaskDispatchReport;

/// Why a schedule dropped out of a cycle.
#[derive(Debug, Error)]
pub enum EvaluationFailureReason {
    /// The trigger engine failed for this schedule.
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// Cancellation was requested before the schedule was evaluated.
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvaluationFailureReason {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Trigger(error) => error.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// A schedule excluded from the current cycle.
#[derive(Debug)]
pub struct ScheduleEvaluationFailure {
    /// Affected schedule.
    pub schedule_id: ScheduleId,
    /// Schedule name at evaluation time.
    pub schedule_name: ScheduleName,
    /// Failure cause.
    pub reason: EvaluationFailureReason,
}

/// Outcome of history recording for a cycle or run.
#[derive(Debug, Default)]
pub enum HistoryStatus {
    /// The history flag is off.
    #[default]
    Disabled,
    /// Nothing fired, so nothing was recorded.
    Skipped,
    /// Entries were sent to the history endpoint.
    Recorded(Vec<ScheduleHistoryEntry>),
    /// Recording failed after tasks were dispatched.
    Failed(HistoryError),
}

impl HistoryStatus {
    /// Returns the recorded entries, if any.
    #[must_use]
    pub fn entries(&self) -> &[ScheduleHistoryEntry] {
        match self {
            Self::Recorded(entries) => entries,
            Self::Disabled | Self::Skipped | Self::Failed(_) => &[],
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Default)]
pub struct PollReport {
    /// Flags in force for the cycle.
    pub flags: FeatureEvaluationResult,
    /// Schedules rewritten by the force-recalculate flag, including any that
    /// fired because their stored runtime had passed.
    pub recalculated: usize,
    /// Active schedules handed to the trigger engine.
    pub evaluated: usize,
    /// Schedules skipped because they are inactive.
    pub skipped_inactive: usize,
    /// Schedules that fired, in store order.
    pub triggered: Vec<TriggeredSchedule>,
    /// Schedules excluded from the cycle.
    pub failures: Vec<ScheduleEvaluationFailure>,
    /// Task dispatch outcome.
    pub dispatch: TaskDispatchReport,
    /// History outcome.
    pub history: HistoryStatus,
    /// Wall time spent in the cycle.
    pub elapsed: Duration,
}

impl PollReport {
    /// Report for a cycle short-circuited by the scheduler flag.
    #[must_use]
    pub fn disabled(flags: FeatureEvaluationResult) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    /// Returns `true` when the cycle fired nothing and dispatched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggered.is_empty() && self.dispatch.is_empty()
    }

    /// Returns the identifiers of the schedules that fired.
    #[must_use]
    pub fn triggered_ids(&self) -> Vec<ScheduleId> {
        self.triggered
            .iter()
            .map(|item| item.schedule().id())
            .collect()
    }

    /// Returns the failure recorded for `schedule_id`, if any.
    #[must_use]
    pub fn failure_for(&self, schedule_id: ScheduleId) -> Option<&ScheduleEvaluationFailure> {
        self.failures
            .iter()
            .find(|failure| failure.schedule_id == schedule_id)
    }
}

/// Outcome of a manual run.
#[derive(Debug)]
pub struct RunReport {
    /// The schedule after it was fired and re-armed.
    pub schedule: Schedule,
    /// Task dispatch outcome.
    pub dispatch: TaskDispatchReport,
    /// History outcome.
    pub history: HistoryStatus,
}
