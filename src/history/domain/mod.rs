//! Domain model for schedule history.

mod entry;
mod ids;

pub use entry::{HISTORY_EVENT_KEY, ScheduleHistoryEntry, ScheduleTaskHistoryItem};
pub use ids::ScheduleHistoryId;
