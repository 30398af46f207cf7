//! Event dispatcher port.

use super::BrokerError;
use crate::dispatch::domain::{DispatchEvent, IdentityClientId};
use crate::error::ErrorKind;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for event dispatch operations.
pub type EventDispatchResult<T> = Result<T, EventDispatchError>;

/// Contract for handing outbound events to the message broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Dispatches a single event authorised for `identity_client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError`] when the event cannot be encoded or
    /// the broker rejects it.
    async fn dispatch_one(
        &self,
        event: DispatchEvent,
        identity_client_id: &IdentityClientId,
    ) -> EventDispatchResult<()> {
        self.dispatch_many(vec![event], identity_client_id).await
    }

    /// Dispatches events sharing one identity client, batching internally.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError`] for the first batch that fails. Batches
    /// sent before the failure are not recalled.
    async fn dispatch_many(
        &self,
        events: Vec<DispatchEvent>,
        identity_client_id: &IdentityClientId,
    ) -> EventDispatchResult<()>;
}

/// Errors returned by event dispatchers.
#[derive(Debug, Clone, Error)]
pub enum EventDispatchError {
    /// The event could not be serialised.
    #[error("failed to encode event '{event_key}': {reason}")]
    Encoding {
        /// Event key of the offending event.
        event_key: String,
        /// Encoder message.
        reason: String,
    },

    /// A single message does not fit into an empty batch.
    #[error("event '{event_key}' of {size_bytes} bytes exceeds the {limit_bytes}-byte batch limit")]
    MessageTooLarge {
        /// Event key of the offending event.
        event_key: String,
        /// Encoded size.
        size_bytes: usize,
        /// Batch byte limit.
        limit_bytes: usize,
    },

    /// The broker failed a batch.
    #[error("batch of {batch_len} events failed: {source}")]
    Batch {
        /// Number of messages in the failed batch.
        batch_len: usize,
        /// Broker failure.
        #[source]
        source: BrokerError,
    },
}

impl EventDispatchError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::DispatchBatch
    }
}
