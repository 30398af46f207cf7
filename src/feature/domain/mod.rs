//! Domain model for feature flags.

mod flags;

pub use flags::{FEATURE_FLAGS_CACHE_KEY, FeatureEvaluationResult};
