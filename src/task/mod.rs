//! Tasks and task dispatch.
//!
//! A task is an outbound HTTP call owned independently of schedules and
//! referenced from schedule links. The dispatch coordinator resolves the
//! tasks linked from triggered schedules and hands them to the event
//! dispatcher. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
