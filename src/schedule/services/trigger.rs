//! Per-schedule trigger evaluation.
//!
//! A schedule moves through `uninitialized -> armed -> triggered -> armed`.
//! Every transition that changes stored state is written back with a
//! version check, so two evaluators racing on the same schedule cannot both
//! advance it.

use chrono_tz::Tz;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

use super::CronScheduleEvaluator;
use crate::config::SchedulerSettings;
use crate::error::ErrorKind;
use crate::schedule::{
    domain::{CronDefinition, CronError, RuntimeQueue, Schedule, ScheduleId, UnixTimestamp},
    ports::{ScheduleRepository, ScheduleRepositoryError},
};

/// Result of evaluating one schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The schedule was due, fired and has been re-armed.
    Triggered(Schedule),
    /// The schedule was initialized or recalculated and is not yet due.
    Armed(Schedule),
    /// The schedule is not due; nothing was written.
    Idle(Schedule),
}

impl TriggerOutcome {
    /// Returns the schedule as it stands after evaluation.
    #[must_use]
    pub const fn schedule(&self) -> &Schedule {
        match self {
            Self::Triggered(schedule) | Self::Armed(schedule) | Self::Idle(schedule) => schedule,
        }
    }

    /// Returns `true` when the schedule fired.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered(_))
    }
}

/// Errors raised while evaluating a single schedule.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The stored CRON expression does not parse.
    #[error("schedule {schedule_id} has an invalid CRON expression: {source}")]
    Cron {
        /// Affected schedule.
        schedule_id: ScheduleId,
        /// Parser failure.
        #[source]
        source: CronError,
    },

    /// Writing the new trigger state failed.
    #[error(transparent)]
    Repository(#[from] ScheduleRepositoryError),
}

impl TriggerError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Cron { .. } => ErrorKind::Validation,
            Self::Repository(ScheduleRepositoryError::VersionConflict { .. }) => {
                ErrorKind::Conflict
            }
            Self::Repository(ScheduleRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(_) => ErrorKind::Unavailable,
        }
    }
}

/// Decides due-ness and maintains runtime queues for schedules.
#[derive(Clone)]
pub struct ScheduleTriggerEngine<R, C>
where
    R: ScheduleRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    evaluator: Arc<CronScheduleEvaluator>,
    clock: Arc<C>,
    timezone: Tz,
    window: chrono::Duration,
    queue_length: usize,
}

impl<R, C> ScheduleTriggerEngine<R, C>
where
    R: ScheduleRepository,
    C: Clock + Send + Sync,
{
    /// Creates an engine using the time zone, window and queue length from
    /// `settings`.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        evaluator: Arc<CronScheduleEvaluator>,
        clock: Arc<C>,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            repository,
            evaluator,
            clock,
            timezone: settings.timezone,
            window: settings.occurrence_window(),
            queue_length: settings.queue_length,
        }
    }

    /// Computes the runtime queue for `cron` starting at `from`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`CronError`] when the expression does not parse.
    pub fn compute_queue(
        &self,
        cron: &CronDefinition,
        from: UnixTimestamp,
    ) -> Result<RuntimeQueue, CronError> {
        let expression = self.evaluator.parse(cron)?;
        let window_end = from.plus_secs(self.window.num_seconds());
        let occurrences =
            self.evaluator
                .next_occurrences(&expression, from, window_end, self.timezone);
        Ok(RuntimeQueue::from_occurrences(occurrences, self.queue_length))
    }

    /// Evaluates one schedule against the current time.
    ///
    /// Uninitialized schedules are armed from now. A due schedule records
    /// now as its last runtime and is re-armed strictly after now, so a
    /// second evaluation in the same second finds it idle.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] when the CRON expression does not parse or
    /// the write is rejected. Nothing is written in either case.
    pub async fn evaluate(
        &self,
        schedule: Schedule,
        log_detail: bool,
    ) -> Result<TriggerOutcome, TriggerError> {
        let now = UnixTimestamp::now(&*self.clock);
        let current = if schedule.is_initialized() {
            schedule
        } else {
            let armed = self.rearm(schedule, now, log_detail).await?;
            if !armed.is_due(now) {
                return Ok(TriggerOutcome::Armed(armed));
            }
            armed
        };

        if !current.is_due(now) {
            tracing::trace!(
                schedule_id = %current.id(),
                time_remaining = ?current.time_remaining(now),
                "schedule not due"
            );
            return Ok(TriggerOutcome::Idle(current));
        }

        self.fire(current, now, log_detail)
            .await
            .map(TriggerOutcome::Triggered)
    }

    /// Fires a schedule regardless of due-ness.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] when the CRON expression does not parse or
    /// the write is rejected.
    pub async fn trigger_now(&self, schedule: Schedule) -> Result<Schedule, TriggerError> {
        let now = UnixTimestamp::now(&*self.clock);
        self.fire(schedule, now, false).await
    }

    /// Recomputes the queue of a schedule from now.
    ///
    /// An active schedule whose stored next runtime has passed fires instead,
    /// so a pending occurrence is never overwritten. Inactive schedules are
    /// always re-armed.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] when the CRON expression does not parse or
    /// the write is rejected.
    pub async fn recalculate(
        &self,
        schedule: Schedule,
        log_detail: bool,
    ) -> Result<TriggerOutcome, TriggerError> {
        let now = UnixTimestamp::now(&*self.clock);
        if schedule.is_active() && schedule.is_due(now) {
            return self
                .fire(schedule, now, log_detail)
                .await
                .map(TriggerOutcome::Triggered);
        }
        self.rearm(schedule, now, log_detail)
            .await
            .map(TriggerOutcome::Armed)
    }

    async fn fire(
        &self,
        mut schedule: Schedule,
        now: UnixTimestamp,
        log_detail: bool,
    ) -> Result<Schedule, TriggerError> {
        let queue = self.queue_for(&schedule, now.plus_secs(1))?;
        schedule.mark_triggered(now, &*self.clock);
        schedule.arm(queue, &*self.clock);
        self.log_queue(&schedule, log_detail);
        if !schedule.is_initialized() {
            tracing::warn!(
                schedule_id = %schedule.id(),
                schedule_name = %schedule.name(),
                "no occurrences within the look-ahead window"
            );
        }
        let expected_version = schedule.version();
        Ok(self.repository.replace(&schedule, expected_version).await?)
    }

    async fn rearm(
        &self,
        mut schedule: Schedule,
        from: UnixTimestamp,
        log_detail: bool,
    ) -> Result<Schedule, TriggerError> {
        let queue = self.queue_for(&schedule, from)?;
        schedule.arm(queue, &*self.clock);
        self.log_queue(&schedule, log_detail);
        let expected_version = schedule.version();
        Ok(self.repository.replace(&schedule, expected_version).await?)
    }

    fn queue_for(
        &self,
        schedule: &Schedule,
        from: UnixTimestamp,
    ) -> Result<RuntimeQueue, TriggerError> {
        self.compute_queue(schedule.cron(), from)
            .map_err(|source| TriggerError::Cron {
                schedule_id: schedule.id(),
                source,
            })
    }

    fn log_queue(&self, schedule: &Schedule, log_detail: bool) {
        let queue = schedule.queue().as_slice();
        if log_detail {
            tracing::info!(
                schedule_id = %schedule.id(),
                schedule_name = %schedule.name(),
                cron = schedule.cron().expression(),
                timezone = %self.timezone,
                next_runtime = ?schedule.next_runtime(),
                queue = ?queue,
                "recomputed runtime queue"
            );
        } else {
            tracing::debug!(
                schedule_id = %schedule.id(),
                next_runtime = ?schedule.next_runtime(),
                queue_len = queue.len(),
                "recomputed runtime queue"
            );
        }
    }
}
