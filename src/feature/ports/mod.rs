//! Port contracts for flag evaluation and caching.

pub mod cache;
pub mod flags;

pub use cache::{CacheError, CacheResult, CacheStore};
#[cfg(test)]
pub use flags::MockFeatureFlagClient;
pub use flags::{FeatureFlagClient, FeatureFlagError, FeatureFlagResult};
