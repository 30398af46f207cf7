//! Application services for feature flags.

mod gate;

pub use gate::{FeatureGate, FeatureGateError};
