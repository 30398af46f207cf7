//! Poll cycle and manual run orchestration.
//!
//! [`services::PollCycleOrchestrator`] drives one pass over every active
//! schedule: it consults the feature gate, evaluates schedules
//! concurrently, dispatches the linked tasks of the schedules that fired and
//! records their history. The same dispatch and history path serves manual
//! runs.
//!
//! - Cycle reports in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
