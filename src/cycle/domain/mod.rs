//! Reports produced by poll cycles and manual runs.

mod report;

pub use report::{
    EvaluationFailureReason, HistoryStatus, PollReport, RunReport, ScheduleEvaluationFailure,
};
