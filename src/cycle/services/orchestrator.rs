//! The poll cycle.

use futures::{StreamExt, stream};
use mockable::Clock;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerSettings;
use crate::cycle::domain::{
    EvaluationFailureReason, HistoryStatus, PollReport, RunReport, ScheduleEvaluationFailure,
};
use crate::dispatch::ports::{EventDispatcher, TokenProvider};
use crate::error::ErrorKind;
use crate::feature::{
    domain::FeatureEvaluationResult,
    ports::{CacheStore, FeatureFlagClient},
    services::{FeatureGate, FeatureGateError},
};
use crate::history::services::HistoryRecorder;
use crate::schedule::{
    domain::{Schedule, ScheduleId, TriggeredSchedule},
    ports::{ScheduleRepository, ScheduleRepositoryError},
    services::{ScheduleTriggerEngine, TriggerError, TriggerOutcome},
};
use crate::task::{
    domain::TaskId,
    ports::TaskRepository,
    services::{TaskDispatchCoordinator, TaskDispatchError, TaskDispatchReport},
};

/// Errors that fail a whole poll cycle or manual run.
#[derive(Debug, Error)]
pub enum PollCycleError {
    /// Another poll cycle is still running in this process.
    #[error("a poll cycle is already running")]
    AlreadyRunning,

    /// Cancellation was requested before any schedule was touched.
    #[error("poll cycle cancelled")]
    Cancelled,

    /// The feature flags could not be read.
    #[error(transparent)]
    Flags(#[from] FeatureGateError),

    /// The schedule store could not be read.
    #[error(transparent)]
    Schedules(#[from] ScheduleRepositoryError),

    /// The schedule to run does not exist.
    #[error("schedule not found: {0}")]
    NotFound(ScheduleId),

    /// The schedule to run could not be fired.
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    /// The linked tasks could not be loaded.
    #[error(transparent)]
    Dispatch(#[from] TaskDispatchError),
}

impl PollCycleError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRunning => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Flags(error) => error.kind(),
            Self::Schedules(_) => ErrorKind::Unavailable,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Trigger(error) => error.kind(),
            Self::Dispatch(error) => error.kind(),
        }
    }
}

/// Drives poll cycles and manual runs.
///
/// Only one poll cycle runs at a time per orchestrator; schedules within a
/// cycle are evaluated concurrently up to the configured limit. Races with
/// other writers of the same schedule are settled by the store's versioned
/// replace.
pub struct PollCycleOrchestrator<S, R, T, D, F, K, C>
where
    S: ScheduleRepository,
    R: TaskRepository,
    T: TokenProvider,
    D: EventDispatcher,
    F: FeatureFlagClient,
    K: CacheStore,
    C: Clock + Send + Sync,
{
    schedules: Arc<S>,
    engine: ScheduleTriggerEngine<S, C>,
    coordinator: TaskDispatchCoordinator<R, T, D, C>,
    recorder: HistoryRecorder<T, D, C>,
    gate: FeatureGate<F, K>,
    evaluation_concurrency: usize,
    running: Mutex<()>,
}

impl<S, R, T, D, F, K, C> PollCycleOrchestrator<S, R, T, D, F, K, C>
where
    S: ScheduleRepository,
    R: TaskRepository,
    T: TokenProvider,
    D: EventDispatcher,
    F: FeatureFlagClient,
    K: CacheStore,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator from its collaborating services.
    #[must_use]
    pub fn new(
        schedules: Arc<S>,
        engine: ScheduleTriggerEngine<S, C>,
        coordinator: TaskDispatchCoordinator<R, T, D, C>,
        recorder: HistoryRecorder<T, D, C>,
        gate: FeatureGate<F, K>,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            schedules,
            engine,
            coordinator,
            recorder,
            gate,
            evaluation_concurrency: settings.evaluation_concurrency.max(1),
            running: Mutex::new(()),
        }
    }

    /// Runs one poll cycle.
    ///
    /// Per-schedule failures are reported in [`PollReport::failures`] and
    /// never stop other schedules. History failures are reported in
    /// [`PollReport::history`]; tasks already dispatched stay dispatched.
    /// Once a schedule has fired its history is recorded even if
    /// `cancellation` fires during dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`PollCycleError::AlreadyRunning`] when another cycle holds
    /// the guard, and flag, store or task-lookup failures that leave
    /// nothing to salvage.
    pub async fn poll(
        &self,
        cancellation: &CancellationToken,
    ) -> Result<PollReport, PollCycleError> {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!("poll cycle skipped: previous cycle still running");
            return Err(PollCycleError::AlreadyRunning);
        };
        let started = Instant::now();
        if cancellation.is_cancelled() {
            return Err(PollCycleError::Cancelled);
        }

        let flags = self.gate.get_flags(cancellation).await?;
        if !flags.scheduler_enabled {
            tracing::info!("scheduler disabled; poll cycle skipped");
            return Ok(PollReport::disabled(flags));
        }
        if cancellation.is_cancelled() {
            return Err(PollCycleError::Cancelled);
        }

        let mut report = PollReport {
            flags,
            ..PollReport::default()
        };
        let stored = self.schedules.list_all().await?;
        let current = if flags.force_recalculate_enabled {
            self.recalculate_all(stored, flags, cancellation, &mut report).await
        } else {
            stored
        };

        let (active, inactive): (Vec<Schedule>, Vec<Schedule>) =
            current.into_iter().partition(Schedule::is_active);
        report.skipped_inactive = inactive.len();
        report.evaluated = active.len();
        self.evaluate_all(active, flags, cancellation, &mut report).await;

        if !report.triggered.is_empty() {
            report.dispatch = self.dispatch_links(&report.triggered, cancellation).await?;
        }
        report.history = self
            .record_history(&report.triggered, &report.dispatch, flags)
            .await;
        report.elapsed = started.elapsed();

        tracing::info!(
            evaluated = report.evaluated,
            skipped_inactive = report.skipped_inactive,
            recalculated = report.recalculated,
            triggered = report.triggered.len(),
            failed = report.failures.len(),
            dispatched = report.dispatch.dispatched.len(),
            dispatch_failures = report.dispatch.failures.len(),
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "poll cycle finished"
        );
        Ok(report)
    }

    /// Fires one schedule now, whatever its runtime state, and sends its
    /// tasks through the same dispatch and history path as a poll cycle.
    ///
    /// The scheduler flag is not consulted; the history flag is.
    ///
    /// # Errors
    ///
    /// Returns [`PollCycleError::NotFound`] for an unknown schedule,
    /// [`PollCycleError::Trigger`] when the schedule cannot be fired
    /// (including a lost race with a concurrent writer, classified as
    /// [`ErrorKind::Conflict`]), and flag or task-lookup failures.
    pub async fn run_schedule(
        &self,
        schedule_id: ScheduleId,
        cancellation: &CancellationToken,
    ) -> Result<RunReport, PollCycleError> {
        if cancellation.is_cancelled() {
            return Err(PollCycleError::Cancelled);
        }
        let flags = self.gate.get_flags(cancellation).await?;
        let schedule = self
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or(PollCycleError::NotFound(schedule_id))?;

        let fired = self.engine.trigger_now(schedule).await?;
        tracing::info!(
            schedule_id = %fired.id(),
            schedule_name = %fired.name(),
            next_runtime = ?fired.next_runtime(),
            "schedule run on demand"
        );
        let triggered = [TriggeredSchedule::manual(fired.clone())];
        let dispatch = self.dispatch_links(&triggered, cancellation).await?;
        let history = self.record_history(&triggered, &dispatch, flags).await;
        Ok(RunReport {
            schedule: fired,
            dispatch,
            history,
        })
    }

    async fn recalculate_all(
        &self,
        stored: Vec<Schedule>,
        flags: FeatureEvaluationResult,
        cancellation: &CancellationToken,
        report: &mut PollReport,
    ) -> Vec<Schedule> {
        tracing::info!(schedules = stored.len(), "force recalculating runtimes");
        let results: Vec<(Schedule, Result<TriggerOutcome, EvaluationFailureReason>)> =
            stream::iter(stored.into_iter().map(|schedule| async move {
                if cancellation.is_cancelled() {
                    return (schedule, Err(EvaluationFailureReason::Cancelled));
                }
                let outcome = self
                    .engine
                    .recalculate(schedule.clone(), flags.calculation_detail_enabled)
                    .await
                    .map_err(EvaluationFailureReason::from);
                (schedule, outcome)
            }))
            .buffered(self.evaluation_concurrency)
            .collect()
            .await;

        let mut recalculated = Vec::with_capacity(results.len());
        for (original, outcome) in results {
            match outcome {
                Ok(TriggerOutcome::Triggered(fired)) => {
                    log_triggered(&fired);
                    report.triggered.push(TriggeredSchedule::polled(fired.clone()));
                    recalculated.push(fired);
                }
                Ok(TriggerOutcome::Armed(updated) | TriggerOutcome::Idle(updated)) => {
                    recalculated.push(updated);
                }
                Err(reason) => record_failure(report, &original, reason),
            }
        }
        report.recalculated = recalculated.len();
        recalculated
    }

    async fn evaluate_all(
        &self,
        active: Vec<Schedule>,
        flags: FeatureEvaluationResult,
        cancellation: &CancellationToken,
        report: &mut PollReport,
    ) {
        let results: Vec<(Schedule, Result<TriggerOutcome, EvaluationFailureReason>)> =
            stream::iter(active.into_iter().map(|schedule| async move {
                if cancellation.is_cancelled() {
                    return (schedule, Err(EvaluationFailureReason::Cancelled));
                }
                let outcome = self
                    .engine
                    .evaluate(schedule.clone(), flags.calculation_detail_enabled)
                    .await
                    .map_err(EvaluationFailureReason::from);
                (schedule, outcome)
            }))
            .buffered(self.evaluation_concurrency)
            .collect()
            .await;

        for (original, outcome) in results {
            match outcome {
                Ok(TriggerOutcome::Triggered(fired)) => {
                    log_triggered(&fired);
                    report.triggered.push(TriggeredSchedule::polled(fired));
                }
                Ok(TriggerOutcome::Armed(_) | TriggerOutcome::Idle(_)) => {}
                Err(reason) => record_failure(report, &original, reason),
            }
        }
    }

    async fn dispatch_links(
        &self,
        triggered: &[TriggeredSchedule],
        cancellation: &CancellationToken,
    ) -> Result<TaskDispatchReport, TaskDispatchError> {
        let links: Vec<TaskId> = triggered
            .iter()
            .flat_map(|item| item.schedule().links())
            .copied()
            .collect();
        self.coordinator
            .execute_tasks(&links, cancellation)
            .await
            .inspect_err(|error| {
                let schedule_ids: Vec<String> = triggered
                    .iter()
                    .map(|item| item.schedule().id().to_string())
                    .collect();
                tracing::error!(
                    error = %error,
                    schedules = ?schedule_ids,
                    "linked tasks could not be loaded for triggered schedules"
                );
            })
    }

    async fn record_history(
        &self,
        triggered: &[TriggeredSchedule],
        dispatch: &TaskDispatchReport,
        flags: FeatureEvaluationResult,
    ) -> HistoryStatus {
        if !flags.history_enabled {
            return HistoryStatus::Disabled;
        }
        if triggered.is_empty() {
            return HistoryStatus::Skipped;
        }
        match self.recorder.record(triggered, dispatch).await {
            Ok(entries) => HistoryStatus::Recorded(entries),
            Err(error) => {
                tracing::error!(
                    error = %error,
                    kind = error.kind().as_str(),
                    schedules = triggered.len(),
                    "history recording failed"
                );
                HistoryStatus::Failed(error)
            }
        }
    }
}

fn log_triggered(schedule: &Schedule) {
    tracing::info!(
        schedule_id = %schedule.id(),
        schedule_name = %schedule.name(),
        last_runtime = ?schedule.last_runtime(),
        next_runtime = ?schedule.next_runtime(),
        "schedule triggered"
    );
}

fn record_failure(report: &mut PollReport, schedule: &Schedule, reason: EvaluationFailureReason) {
    tracing::error!(
        schedule_id = %schedule.id(),
        schedule_name = %schedule.name(),
        error = %reason,
        kind = reason.kind().as_str(),
        "schedule excluded from poll cycle"
    );
    report.failures.push(ScheduleEvaluationFailure {
        schedule_id: schedule.id(),
        schedule_name: schedule.name().clone(),
        reason,
    });
}
