//! Cached evaluation of the poll-cycle flag bundle.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{FeatureFlagKeys, SchedulerSettings};
use crate::error::ErrorKind;
use crate::feature::{
    domain::{FEATURE_FLAGS_CACHE_KEY, FeatureEvaluationResult},
    ports::{CacheStore, FeatureFlagClient, FeatureFlagError},
};

/// Errors raised while reading the flag bundle.
#[derive(Debug, Error)]
pub enum FeatureGateError {
    /// A flag could not be evaluated.
    #[error(transparent)]
    Flag(#[from] FeatureFlagError),

    /// Cancellation was requested while flags were being evaluated.
    #[error("feature flag evaluation cancelled")]
    Cancelled,
}

impl FeatureGateError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Flag(_) => ErrorKind::Unavailable,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Serves the four poll-cycle flags, evaluating them at most once per cache
/// lifetime.
///
/// Cache failures and undecodable cache entries are treated as misses.
#[derive(Clone)]
pub struct FeatureGate<F, S>
where
    F: FeatureFlagClient,
    S: CacheStore,
{
    flags: Arc<F>,
    cache: Arc<S>,
    keys: FeatureFlagKeys,
    ttl: Duration,
}

impl<F, S> FeatureGate<F, S>
where
    F: FeatureFlagClient,
    S: CacheStore,
{
    /// Creates a gate using the flag keys and cache lifetime in `settings`.
    #[must_use]
    pub fn new(flags: Arc<F>, cache: Arc<S>, settings: &SchedulerSettings) -> Self {
        Self {
            flags,
            cache,
            keys: settings.flags.clone(),
            ttl: settings.feature_cache_ttl(),
        }
    }

    /// Returns the current flag bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureGateError::Flag`] when any flag evaluation fails and
    /// [`FeatureGateError::Cancelled`] when `cancellation` fires first.
    pub async fn get_flags(
        &self,
        cancellation: &CancellationToken,
    ) -> Result<FeatureEvaluationResult, FeatureGateError> {
        if let Some(cached) = self.cached().await {
            tracing::debug!(key = FEATURE_FLAGS_CACHE_KEY, "feature flag cache hit");
            return Ok(cached);
        }
        tracing::debug!(key = FEATURE_FLAGS_CACHE_KEY, "feature flag cache miss");

        let evaluated = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(FeatureGateError::Cancelled),
            result = self.evaluate_all() => result?,
        };
        self.store(&evaluated).await;
        tracing::info!(
            scheduler = evaluated.scheduler_enabled,
            calculation_detail = evaluated.calculation_detail_enabled,
            history = evaluated.history_enabled,
            force_recalculate = evaluated.force_recalculate_enabled,
            "feature flags evaluated"
        );
        Ok(evaluated)
    }

    async fn evaluate_all(&self) -> Result<FeatureEvaluationResult, FeatureFlagError> {
        let (
            scheduler_enabled,
            calculation_detail_enabled,
            history_enabled,
            force_recalculate_enabled,
        ) = tokio::try_join!(
            self.flags.evaluate(&self.keys.scheduler),
            self.flags.evaluate(&self.keys.calculation_detail),
            self.flags.evaluate(&self.keys.history),
            self.flags.evaluate(&self.keys.force_recalculate),
        )?;
        Ok(FeatureEvaluationResult {
            scheduler_enabled,
            calculation_detail_enabled,
            history_enabled,
            force_recalculate_enabled,
        })
    }

    async fn cached(&self) -> Option<FeatureEvaluationResult> {
        let bytes = match self.cache.get(FEATURE_FLAGS_CACHE_KEY).await {
            Ok(found) => found?,
            Err(error) => {
                tracing::warn!(error = %error, "feature flag cache read failed");
                return None;
            }
        };
        serde_json::from_slice(&bytes)
            .inspect_err(|error| {
                tracing::warn!(error = %error, "discarding undecodable feature flag cache entry");
            })
            .ok()
    }

    async fn store(&self, evaluated: &FeatureEvaluationResult) {
        let bytes = match serde_json::to_vec(evaluated) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(error = %error, "feature flag bundle not cached");
                return;
            }
        };
        if let Err(error) = self.cache.set(FEATURE_FLAGS_CACHE_KEY, bytes, self.ttl).await {
            tracing::warn!(error = %error, "feature flag cache write failed");
        }
    }
}
