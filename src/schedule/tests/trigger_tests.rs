//! Trigger engine tests.

use std::sync::Arc;

use crate::config::SchedulerSettings;
use crate::error::ErrorKind;
use crate::schedule::{
    adapters::memory::InMemoryScheduleRepository,
    domain::{
        CronDefinition, NewSchedule, PersistedScheduleData, RuntimeQueue, Schedule, ScheduleName,
        ScheduleType, UnixTimestamp,
    },
    ports::{ScheduleRepository, ScheduleRepositoryError},
    services::{CronScheduleEvaluator, ScheduleTriggerEngine, TriggerError, TriggerOutcome},
};
use crate::test_support::FixedClock;
use rstest::{fixture, rstest};

// 2026-01-01T12:00:30Z
const NOW: i64 = 1_767_268_830;
const MINUTE: i64 = 60;

type TestEngine = ScheduleTriggerEngine<InMemoryScheduleRepository, FixedClock>;

struct Harness {
    clock: Arc<FixedClock>,
    repository: Arc<InMemoryScheduleRepository>,
    engine: TestEngine,
}

impl Harness {
    async fn seed(&self, cron: &str, next_runtime: Option<i64>) -> Schedule {
        self.seed_with_activity(cron, next_runtime, None).await
    }

    async fn seed_with_activity(
        &self,
        cron: &str,
        next_runtime: Option<i64>,
        is_active: Option<bool>,
    ) -> Schedule {
        let fresh = Schedule::new(
            NewSchedule {
                name: ScheduleName::new(format!("schedule-{cron}-{next_runtime:?}"))
                    .expect("valid name"),
                schedule_type: ScheduleType::User,
                cron: CronDefinition::new(cron, false).expect("valid definition"),
                links: Vec::new(),
                is_active: None,
            },
            &*self.clock,
        );
        let queue: RuntimeQueue = next_runtime
            .map(|secs| vec![UnixTimestamp::from_secs(secs)])
            .unwrap_or_default()
            .into();
        let seeded = Schedule::from_persisted(PersistedScheduleData {
            id: fresh.id(),
            name: fresh.name().clone(),
            schedule_type: fresh.schedule_type(),
            cron: fresh.cron().clone(),
            last_runtime: None,
            next_runtime: next_runtime.map(UnixTimestamp::from_secs),
            queue,
            links: Vec::new(),
            is_active,
            version: 0,
            created_at: fresh.created_at(),
            modified_at: None,
        });
        self.repository
            .insert(&seeded)
            .await
            .expect("seed insert should succeed")
    }

    fn now(&self) -> UnixTimestamp {
        self.clock.now()
    }
}

fn engine_for(clock: &Arc<FixedClock>, repository: &Arc<InMemoryScheduleRepository>) -> TestEngine {
    let settings = SchedulerSettings {
        timezone: chrono_tz::UTC,
        ..SchedulerSettings::default()
    };
    ScheduleTriggerEngine::new(
        Arc::clone(repository),
        Arc::new(CronScheduleEvaluator::new()),
        Arc::clone(clock),
        &settings,
    )
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(FixedClock::at_secs(NOW));
    let repository = Arc::new(InMemoryScheduleRepository::new());
    let engine = engine_for(&clock, &repository);
    Harness {
        clock,
        repository,
        engine,
    }
}

fn assert_queue_invariant(schedule: &Schedule) {
    assert!(schedule.queue().len() <= 5);
    assert_eq!(schedule.next_runtime(), schedule.queue().first());
    let runtimes = schedule.queue().as_slice();
    assert!(runtimes.windows(2).all(|pair| pair.first() < pair.last()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uninitialized_schedule_is_armed_within_the_next_minute(harness: Harness) {
    let seeded = harness.seed("* * * * *", None).await;

    let outcome = harness
        .engine
        .evaluate(seeded, false)
        .await
        .expect("evaluation should succeed");

    let TriggerOutcome::Armed(armed) = outcome else {
        panic!("expected an armed schedule, got {outcome:?}");
    };
    let next = armed.next_runtime().expect("next runtime set");
    assert!(next > harness.now());
    assert!(harness.now().secs_until(next) <= MINUTE);
    assert_eq!(armed.queue().len(), 5);
    let runtimes = armed.queue().as_slice();
    assert!(
        runtimes
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.secs_until(*b) == MINUTE))
    );
    assert_queue_invariant(&armed);
    assert_eq!(harness.repository.write_count(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn initialization_on_an_occurrence_boundary_fires_immediately(harness: Harness) {
    harness.clock.advance_secs(30);
    let seeded = harness.seed("* * * * *", None).await;

    let outcome = harness
        .engine
        .evaluate(seeded, false)
        .await
        .expect("evaluation should succeed");

    let TriggerOutcome::Triggered(fired) = outcome else {
        panic!("expected a triggered schedule, got {outcome:?}");
    };
    assert_eq!(fired.last_runtime(), Some(harness.now()));
    assert!(fired.next_runtime().is_some_and(|next| next > harness.now()));
    assert_queue_invariant(&fired);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missed_schedule_catches_up_and_rearms_in_the_future(harness: Harness) {
    let seeded = harness.seed("* * * * *", Some(NOW - 10 * MINUTE)).await;

    let outcome = harness
        .engine
        .evaluate(seeded, true)
        .await
        .expect("evaluation should succeed");

    let TriggerOutcome::Triggered(fired) = outcome else {
        panic!("expected a triggered schedule, got {outcome:?}");
    };
    assert_eq!(fired.last_runtime(), Some(harness.now()));
    assert!(fired.next_runtime().is_some_and(|next| next > harness.now()));
    assert_queue_invariant(&fired);
    let stored = harness
        .repository
        .find_by_id(fired.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(stored, Some(fired));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn re_evaluating_in_the_same_second_is_idle(harness: Harness) {
    let seeded = harness.seed("* * * * *", Some(NOW - MINUTE)).await;
    let fired = harness
        .engine
        .evaluate(seeded, false)
        .await
        .expect("first evaluation should succeed");
    let writes = harness.repository.write_count();

    let second = harness
        .engine
        .evaluate(fired.schedule().clone(), false)
        .await
        .expect("second evaluation should succeed");

    assert!(matches!(second, TriggerOutcome::Idle(_)));
    assert_eq!(harness.repository.write_count(), writes);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_stale_copy_loses_the_race(harness: Harness) {
    let seeded = harness.seed("* * * * *", Some(NOW - MINUTE)).await;
    harness
        .engine
        .evaluate(seeded.clone(), false)
        .await
        .expect("first evaluation should succeed");

    let result = harness.engine.evaluate(seeded, false).await;

    let error = result.expect_err("stale copy must not overwrite");
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert!(matches!(
        error,
        TriggerError::Repository(ScheduleRepositoryError::VersionConflict { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn corrupted_cron_fails_without_writing(harness: Harness) {
    let seeded = harness.seed("99 * * * *", Some(NOW - MINUTE)).await;
    let writes = harness.repository.write_count();

    let result = harness.engine.evaluate(seeded.clone(), false).await;

    assert!(matches!(
        result,
        Err(TriggerError::Cron { schedule_id, .. }) if schedule_id == seeded.id()
    ));
    assert_eq!(harness.repository.write_count(), writes);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expression_without_occurrences_in_the_window_stays_uninitialized(harness: Harness) {
    // Only fires on 1 January; the clock sits on 1 January 12:00:30.
    let seeded = harness.seed("0 0 1 1 *", None).await;

    let outcome = harness
        .engine
        .evaluate(seeded, false)
        .await
        .expect("evaluation should succeed");

    assert!(matches!(outcome, TriggerOutcome::Armed(_)));
    assert!(!outcome.schedule().is_initialized());
    assert!(outcome.schedule().queue().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recalculate_rebuilds_the_queue_from_now(harness: Harness) {
    let seeded = harness.seed("*/5 * * * *", Some(NOW + 3 * 86_400)).await;

    let outcome = harness
        .engine
        .recalculate(seeded, false)
        .await
        .expect("recalculation should succeed");

    let TriggerOutcome::Armed(recalculated) = outcome else {
        panic!("expected the schedule to be re-armed, got {outcome:?}");
    };
    let next = recalculated.next_runtime().expect("next runtime set");
    assert!(harness.now().secs_until(next) <= 5 * MINUTE);
    assert!(recalculated.last_runtime().is_none());
    assert_queue_invariant(&recalculated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recalculate_fires_an_overdue_schedule(harness: Harness) {
    let seeded = harness.seed("* * * * *", Some(NOW - MINUTE)).await;

    let outcome = harness
        .engine
        .recalculate(seeded, false)
        .await
        .expect("recalculation should succeed");

    let TriggerOutcome::Triggered(fired) = outcome else {
        panic!("expected the overdue schedule to fire, got {outcome:?}");
    };
    assert_eq!(fired.last_runtime(), Some(harness.now()));
    assert!(fired.next_runtime().is_some_and(|next| next > harness.now()));
    assert_queue_invariant(&fired);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recalculate_rearms_an_overdue_inactive_schedule(harness: Harness) {
    let seeded = harness
        .seed_with_activity("* * * * *", Some(NOW - MINUTE), Some(false))
        .await;

    let outcome = harness
        .engine
        .recalculate(seeded, false)
        .await
        .expect("recalculation should succeed");

    let TriggerOutcome::Armed(rearmed) = outcome else {
        panic!("an inactive schedule must not fire, got {outcome:?}");
    };
    assert!(rearmed.last_runtime().is_none());
    assert!(rearmed.next_runtime().is_some_and(|next| next >= harness.now()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trigger_now_fires_a_schedule_that_is_not_due(harness: Harness) {
    let seeded = harness.seed("0 0 * * *", Some(NOW + 3600)).await;

    let fired = harness
        .engine
        .trigger_now(seeded)
        .await
        .expect("manual trigger should succeed");

    assert_eq!(fired.last_runtime(), Some(harness.now()));
    assert!(fired.next_runtime().is_some_and(|next| next > harness.now()));
}
