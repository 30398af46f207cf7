//! Then steps for poll cycle BDD scenarios.

use super::world::{PollCycleWorld, run_async};
use crate::test_helpers::NEXT_HOUR;
use metronome::error::ErrorKind;
use metronome::schedule::domain::{ScheduleType, UnixTimestamp};
use rstest_bdd_macros::then;

#[then(r#"schedule "{name}" is armed for the next hour"#)]
fn armed_for_next_hour(world: &PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let schedule = run_async(world.scheduler.schedule_named(&name))?;
    let expected = Some(UnixTimestamp::from_secs(NEXT_HOUR));
    if schedule.next_runtime() != expected {
        return Err(eyre::eyre!(
            "expected {name} armed for {expected:?}, found {:?}",
            schedule.next_runtime()
        ));
    }
    if schedule.last_runtime().is_some() {
        return Err(eyre::eyre!("{name} fired while being armed"));
    }
    Ok(())
}

#[then(r#"schedule "{name}" is not armed"#)]
fn not_armed(world: &PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let schedule = run_async(world.scheduler.schedule_named(&name))?;
    if schedule.is_initialized() || schedule.last_runtime().is_some() {
        return Err(eyre::eyre!("expected {name} untouched, found {schedule:?}"));
    }
    Ok(())
}

#[then(r#"schedule "{name}" fired"#)]
fn schedule_fired(world: &PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let schedule = run_async(world.scheduler.schedule_named(&name))?;
    let report = world.last_report()?;
    if !report.triggered_ids().contains(&schedule.id()) {
        return Err(eyre::eyre!("{name} is missing from {:?}", report.triggered_ids()));
    }
    let now = world.scheduler.clock.now();
    if schedule.last_runtime() != Some(now) {
        return Err(eyre::eyre!(
            "expected last runtime {now:?}, found {:?}",
            schedule.last_runtime()
        ));
    }
    if !schedule.next_runtime().is_some_and(|next| next > now) {
        return Err(eyre::eyre!("{name} was not re-armed into the future"));
    }
    Ok(())
}

#[then("{count:usize} schedules fired")]
fn schedules_fired(world: &PollCycleWorld, count: usize) -> Result<(), eyre::Report> {
    let fired = world.last_report()?.triggered.len();
    if fired != count {
        return Err(eyre::eyre!("expected {count} schedules to fire, got {fired}"));
    }
    Ok(())
}

#[then("{count:usize} task events are sent")]
fn task_events_sent(world: &PollCycleWorld, count: usize) -> Result<(), eyre::Report> {
    let sent = world.scheduler.task_envelopes()?;
    if sent.len() != count {
        return Err(eyre::eyre!("expected {count} task events, got {sent:?}"));
    }
    Ok(())
}

#[then("{count:usize} history events are sent")]
fn history_events_sent(world: &PollCycleWorld, count: usize) -> Result<(), eyre::Report> {
    let sent = world.scheduler.history_envelopes()?;
    if sent.len() != count {
        return Err(eyre::eyre!("expected {count} history events, got {sent:?}"));
    }
    Ok(())
}

#[then(r#"schedule "{name}" is reported as failed"#)]
fn reported_as_failed(world: &PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let schedule = run_async(world.scheduler.schedule_named(&name))?;
    let report = world.last_report()?;
    let failure = report
        .failure_for(schedule.id())
        .ok_or_else(|| eyre::eyre!("no failure recorded for {name}"))?;
    if failure.reason.kind() != ErrorKind::Validation {
        return Err(eyre::eyre!("unexpected failure for {name}: {:?}", failure.reason));
    }
    Ok(())
}

#[then("the creation fails with a validation error")]
fn creation_fails(world: &PollCycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_create
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing create result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::Validation => Ok(()),
        other => Err(eyre::eyre!("expected a validation error, got {other:?}")),
    }
}

#[then(r#"no schedule named "{name}" exists"#)]
fn no_schedule_named(world: &PollCycleWorld, name: String) -> Result<(), eyre::Report> {
    let found = run_async(
        world
            .scheduler
            .schedule_service
            .find_by_name(&name, ScheduleType::User),
    )?;
    if found.is_some() {
        return Err(eyre::eyre!("schedule {name} should not be stored"));
    }
    Ok(())
}

#[then("the poll reports the scheduler disabled")]
fn poll_reports_disabled(world: &PollCycleWorld) -> Result<(), eyre::Report> {
    let report = world.last_report()?;
    if report.flags.scheduler_enabled || report.evaluated != 0 || !report.is_empty() {
        return Err(eyre::eyre!("expected a disabled cycle, got {report:?}"));
    }
    Ok(())
}
