//! When steps for poll cycle BDD scenarios.

use super::world::{PollCycleWorld, run_async};
use crate::test_helpers::HOUR;
use metronome::schedule::services::CreateScheduleRequest;
use rstest_bdd_macros::when;
use tokio_util::sync::CancellationToken;

#[when("the scheduler polls")]
fn scheduler_polls(world: &mut PollCycleWorld) {
    let result = run_async(world.scheduler.orchestrator.poll(&CancellationToken::new()));
    world.last_poll = Some(result);
}

#[when("{hours:i64} hours pass")]
fn hours_pass(world: &mut PollCycleWorld, hours: i64) {
    world.scheduler.clock.advance_secs(hours * HOUR);
}

#[when(r#"a schedule "{name}" is created with cron "{cron}""#)]
fn schedule_created(world: &mut PollCycleWorld, name: String, cron: String) {
    let result = run_async(
        world
            .scheduler
            .schedule_service
            .create(CreateScheduleRequest::new(name, cron)),
    );
    world.last_create = Some(result);
}
