//! Port contracts for schedule persistence.

pub mod repository;

pub use repository::{ScheduleRepository, ScheduleRepositoryError, ScheduleRepositoryResult};
