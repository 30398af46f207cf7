//! Application services for schedules.

mod catalog;
mod evaluator;
mod trigger;

pub use catalog::{
    CreateScheduleRequest, ScheduleService, ScheduleServiceError, ScheduleServiceResult,
    UpdateScheduleRequest,
};
pub use evaluator::CronScheduleEvaluator;
pub use trigger::{ScheduleTriggerEngine, TriggerError, TriggerOutcome};
