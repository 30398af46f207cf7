//! Port contracts for history persistence.

pub mod repository;

pub use repository::{HistoryRepository, HistoryRepositoryError, HistoryRepositoryResult};
