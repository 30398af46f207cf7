//! Manual run tests.

use tokio_util::sync::CancellationToken;

use super::harness::{Harness, NOW};
use crate::cycle::{domain::HistoryStatus, services::PollCycleError};
use crate::error::ErrorKind;
use crate::schedule::{
    domain::{ScheduleId, UnixTimestamp},
    ports::ScheduleRepositoryError,
    services::TriggerError,
};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_fires_a_schedule_that_is_not_due(harness: Harness) {
    let task = harness.add_task("job").await;
    let seeded = harness
        .seed("daily", "0 0 * * *", Some(NOW + 3_600), vec![task])
        .await;

    let run = harness
        .orchestrator()
        .run_schedule(seeded.id(), &CancellationToken::new())
        .await
        .expect("manual run should succeed");

    assert_eq!(run.schedule.last_runtime(), Some(UnixTimestamp::from_secs(NOW)));
    assert!(run.schedule.next_runtime().is_some_and(|next| next.as_secs() > NOW));
    assert!(run.dispatch.invocation_for(task).is_some());
    let [entry] = run.history.entries() else {
        panic!("expected one history entry, got {:?}", run.history);
    };
    assert!(entry.is_manual_trigger());
    assert_eq!(harness.stored(seeded.id()).await, run.schedule);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_ignores_the_scheduler_flag(harness: Harness) {
    harness.set_flag(&harness.settings.flags.scheduler, false);
    let seeded = harness.seed("manual-only", "0 0 * * *", None, Vec::new()).await;

    let run = harness
        .orchestrator()
        .run_schedule(seeded.id(), &CancellationToken::new())
        .await
        .expect("manual run should succeed");

    assert!(run.schedule.last_runtime().is_some());
    assert_eq!(run.history.entries().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_honours_the_history_flag(harness: Harness) {
    harness.set_flag(&harness.settings.flags.history, false);
    let seeded = harness.seed("quiet", "0 0 * * *", None, Vec::new()).await;

    let run = harness
        .orchestrator()
        .run_schedule(seeded.id(), &CancellationToken::new())
        .await
        .expect("manual run should succeed");

    assert!(matches!(run.history, HistoryStatus::Disabled));
    assert!(harness.history_envelopes().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_schedule_is_not_found(harness: Harness) {
    let result = harness
        .orchestrator()
        .run_schedule(ScheduleId::new(), &CancellationToken::new())
        .await;

    let error = result.expect_err("unknown schedule must fail");
    assert!(matches!(error, PollCycleError::NotFound(_)));
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_write_dispatches_nothing(harness: Harness) {
    let task = harness.add_task("job").await;
    let seeded = harness
        .seed("unlucky", "0 0 * * *", Some(NOW + 3_600), vec![task])
        .await;
    harness.schedules.fail_writes_for(seeded.id());

    let result = harness
        .orchestrator()
        .run_schedule(seeded.id(), &CancellationToken::new())
        .await;

    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Unavailable));
    assert_eq!(harness.broker.batch_count(), 0);
    assert!(harness.tasks.batch_lookups().is_empty());
}

#[rstest]
fn a_lost_race_is_a_conflict() {
    let error = PollCycleError::from(TriggerError::from(
        ScheduleRepositoryError::VersionConflict {
            id: ScheduleId::new(),
            expected: 2,
            actual: 3,
        },
    ));

    assert_eq!(error.kind(), ErrorKind::Conflict);
}
