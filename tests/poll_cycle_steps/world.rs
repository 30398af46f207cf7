//! Shared world state for poll cycle BDD scenarios.

use std::collections::HashMap;

use crate::test_helpers::SchedulerFixture;
use metronome::cycle::{domain::PollReport, services::PollCycleError};
use metronome::schedule::{domain::Schedule, services::ScheduleServiceError};
use metronome::task::domain::TaskId;
use rstest::fixture;

/// Scenario world for poll cycle behaviour tests.
pub struct PollCycleWorld {
    pub scheduler: SchedulerFixture,
    pub tasks: HashMap<String, TaskId>,
    pub last_poll: Option<Result<PollReport, PollCycleError>>,
    pub last_create: Option<Result<Schedule, ScheduleServiceError>>,
}

impl PollCycleWorld {
    /// Creates a world with an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheduler: SchedulerFixture::new(),
            tasks: HashMap::new(),
            last_poll: None,
            last_create: None,
        }
    }

    /// Returns the report of the most recent successful poll.
    pub fn last_report(&self) -> Result<&PollReport, eyre::Report> {
        match self.last_poll.as_ref() {
            Some(Ok(report)) => Ok(report),
            Some(Err(err)) => Err(eyre::eyre!("last poll failed: {err}")),
            None => Err(eyre::eyre!("no poll has run in scenario world")),
        }
    }
}

impl Default for PollCycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PollCycleWorld {
    PollCycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
