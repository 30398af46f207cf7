//! Metronome: schedule trigger evaluation and task dispatch.
//!
//! This crate decides when user-defined CRON schedules are due, advances
//! their runtime state, and fans triggered schedules out into outbound task
//! events and schedule history records.
//!
//! # Architecture
//!
//! Metronome follows hexagonal architecture principles:
//!
//! - **Domain**: Pure scheduling types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for stores, brokers, identity and
//!   feature-flag collaborators
//! - **Adapters**: In-memory implementations of ports
//! - **Services**: Orchestration of domain types through ports
//!
//! # Modules
//!
//! - [`schedule`]: Schedule model, CRON evaluation and trigger engine
//! - [`task`]: Task model, task catalogue and task dispatch
//! - [`dispatch`]: Outbound events, broker batching and token resolution
//! - [`history`]: Schedule invocation history
//! - [`feature`]: Feature flag evaluation and caching
//! - [`cycle`]: Poll cycle and manual run orchestration
//! - [`config`]: Scheduler settings

pub mod config;
pub mod cycle;
pub mod dispatch;
pub mod error;
pub mod feature;
pub mod history;
pub mod schedule;
pub mod task;

#[cfg(test)]
pub(crate) mod test_support;
