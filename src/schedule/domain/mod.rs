//! Domain model for schedules.
//!
//! Runtime fields are whole-second Unix timestamps. A schedule without a
//! next runtime is uninitialized and must have its occurrence queue computed
//! before it can be evaluated for due-ness.

mod cron;
mod error;
mod ids;
mod queue;
mod schedule;
mod time;
mod triggered;

pub use cron::{CronDefinition, CronError, CronExpression};
pub use error::{ParseScheduleTypeError, ScheduleDomainError};
pub use ids::{ScheduleId, ScheduleName, ScheduleType};
pub use queue::{MAX_QUEUE_LENGTH, RuntimeQueue};
pub use schedule::{NewSchedule, PersistedScheduleData, Schedule, ScheduleChanges};
pub use time::UnixTimestamp;
pub use triggered::{TriggerOrigin, TriggeredSchedule};
