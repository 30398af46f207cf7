//! Short-lived key/value cache port.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-oriented cache with per-entry expiry.
///
/// Callers own serialisation of the stored values.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live value stored under `key`.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;
}

/// Errors returned by cache adapters.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Cache backend failure.
    #[error("cache backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
