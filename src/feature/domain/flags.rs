//! The per-cycle flag bundle.

use serde::{Deserialize, Serialize};

/// Cache key under which the evaluated bundle is stored.
pub const FEATURE_FLAGS_CACHE_KEY: &str = "net-scheduler-feature-flags";

/// The four flags that steer one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEvaluationResult {
    /// Master switch; a disabled scheduler makes the poll cycle a no-op.
    pub scheduler_enabled: bool,
    /// Log recomputed runtime queues at `info` instead of `debug`.
    pub calculation_detail_enabled: bool,
    /// Record schedule history after dispatch.
    pub history_enabled: bool,
    /// Recompute runtimes for every schedule before evaluation.
    pub force_recalculate_enabled: bool,
}

impl FeatureEvaluationResult {
    /// Returns a bundle with every flag switched on.
    #[must_use]
    pub const fn all_enabled() -> Self {
        Self {
            scheduler_enabled: true,
            calculation_detail_enabled: true,
            history_enabled: true,
            force_recalculate_enabled: true,
        }
    }
}
