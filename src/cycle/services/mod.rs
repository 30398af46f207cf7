//! Application services for the poll cycle.

mod orchestrator;

pub use orchestrator::{PollCycleError, PollCycleOrchestrator};
