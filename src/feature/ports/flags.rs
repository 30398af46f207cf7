//! Feature flag service port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for flag evaluation.
pub type FeatureFlagResult<T> = Result<T, FeatureFlagError>;

/// Evaluates one boolean feature flag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeatureFlagClient: Send + Sync {
    /// Returns the current value of `flag_key`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureFlagError`] when the flag service cannot answer.
    async fn evaluate(&self, flag_key: &str) -> FeatureFlagResult<bool>;
}

/// Errors returned by feature flag clients.
#[derive(Debug, Clone, Error)]
pub enum FeatureFlagError {
    /// The flag service could not be reached or failed the request.
    #[error("feature flag '{flag_key}' could not be evaluated: {cause}")]
    Unavailable {
        /// Flag being evaluated.
        flag_key: String,
        /// Underlying failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl FeatureFlagError {
    /// Wraps a flag service failure for `flag_key`.
    pub fn unavailable(
        flag_key: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            flag_key: flag_key.into(),
            cause: Arc::new(err),
        }
    }
}
