//! Given steps for poll cycle BDD scenarios.

use super::world::{PollCycleWorld, run_async};
use crate::test_helpers::{HOUR, START};
use eyre::WrapErr;
use metronome::schedule::services::CreateScheduleRequest;
use rstest_bdd_macros::given;
use tokio_util::sync::CancellationToken;

#[given(r#"a task "{name}""#)]
fn a_task(world: &mut PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let id = run_async(world.scheduler.add_task(&name)).wrap_err("register task")?;
    world.tasks.insert(name, id);
    Ok(())
}

#[given(r#"a schedule "{name}" with cron "{cron}" linked to "{task}""#)]
fn a_linked_schedule(
    world: &mut PollCycleWorld,
    name: String,
    cron: String,
    task: String,
) -> Result<(), eyre::Report> {
    let task_id = *world
        .tasks
        .get(&task)
        .ok_or_else(|| eyre::eyre!("task {task} was not registered"))?;
    run_async(
        world
            .scheduler
            .schedule_service
            .create(CreateScheduleRequest::new(name, cron).with_links([task_id])),
    )
    .wrap_err("create schedule")?;
    Ok(())
}

#[given(r#"a stored schedule "{name}" with cron "{cron}" that is due"#)]
fn a_stored_due_schedule(
    world: &mut PollCycleWorld,
    name: String,
    cron: String,
) -> Result<(), eyre::Report> {
    let links = world.tasks.values().copied().collect();
    run_async(
        world
            .scheduler
            .insert_unchecked(&name, &cron, Some(START - 60), links),
    )
    .wrap_err("store unchecked schedule")?;
    Ok(())
}

#[given("the scheduler flag is off")]
fn scheduler_flag_off(world: &mut PollCycleWorld) {
    let key = world.scheduler.settings.flags.scheduler.clone();
    world.scheduler.flags.set_flag(key, false);
}

#[given("the scheduler has polled")]
fn scheduler_has_polled(world: &mut PollCycleWorld) -> Result<(), eyre::Report> {
    let report = run_async(world.scheduler.orchestrator.poll(&CancellationToken::new()))
        .wrap_err("poll in scenario setup")?;
    world.last_poll = Some(Ok(report));
    Ok(())
}

#[given("{hours:i64} hours pass")]
fn hours_have_passed(world: &mut PollCycleWorld, hours: i64) {
    world.scheduler.clock.advance_secs(hours * HOUR);
}
