//! Recording in-memory message broker.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::dispatch::{
    adapters::EventEnvelope,
    domain::MessageBatch,
    ports::{BrokerError, BrokerResult, MessageBroker},
};

/// Thread-safe broker that records every accepted batch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageBroker {
    batches: Arc<RwLock<Vec<MessageBatch>>>,
    reject: Arc<AtomicBool>,
}

impl InMemoryMessageBroker {
    /// Creates an empty broker that accepts every batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends fail with [`BrokerError::Rejected`].
    pub fn reject_batches(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Returns the accepted batches in send order.
    #[must_use]
    pub fn batches(&self) -> Vec<MessageBatch> {
        self.batches
            .read()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    /// Returns the number of accepted batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.read().map(|batches| batches.len()).unwrap_or(0)
    }

    /// Decodes every accepted message into its envelope.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when a message body is not an
    /// [`EventEnvelope`].
    pub fn sent_envelopes(&self) -> Result<Vec<EventEnvelope>, serde_json::Error> {
        self.batches()
            .iter()
            .flat_map(MessageBatch::messages)
            .map(|message| serde_json::from_slice(&message.body))
            .collect()
    }
}

#[async_trait]
impl MessageBroker for InMemoryMessageBroker {
    async fn send_batch(&self, batch: MessageBatch) -> BrokerResult<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(BrokerError::Rejected(format!(
                "batch of {} messages refused",
                batch.len()
            )));
        }
        let mut batches = self
            .batches
            .write()
            .map_err(|err| BrokerError::transport(std::io::Error::other(err.to_string())))?;
        batches.push(batch);
        Ok(())
    }
}
