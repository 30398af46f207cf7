//! Schedule invocation history.
//!
//! Every triggered schedule produces one immutable
//! [`domain::ScheduleHistoryEntry`] per cycle. The
//! [`services::HistoryRecorder`] builds the entries from the dispatch report
//! and sends them as events to the history endpoint; the
//! [`services::ScheduleHistoryService`] persists entries received there and
//! serves range queries.
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
