//! Message broker port.

use crate::dispatch::domain::MessageBatch;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Low-level broker contract: sends one pre-built batch.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Sends every message in `batch` as a single broker operation.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the broker rejects or fails the batch.
    async fn send_batch(&self, batch: MessageBatch) -> BrokerResult<()>;
}

/// Errors returned by broker adapters.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// The broker refused the batch.
    #[error("broker rejected batch: {0}")]
    Rejected(String),

    /// Transport-level failure.
    #[error("broker transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl BrokerError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
