//! Application services for schedule history.

mod query;
mod recorder;

pub use query::{HistoryQueryError, ScheduleHistoryService};
pub use recorder::{HistoryError, HistoryRecorder};
