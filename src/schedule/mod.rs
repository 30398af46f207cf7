//! Schedule definitions and trigger evaluation.
//!
//! A schedule pairs a CRON expression with a set of linked tasks. The
//! trigger engine keeps each schedule's next runtime and upcoming-occurrence
//! queue current, decides whether the schedule is due, and re-arms it after
//! it fires. The module follows hexagonal architecture:
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
