//! Size-bounded broker batches.

use super::IdentityClientId;

/// Serialised event ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Deterministic message identifier used for broker-side deduplication.
    pub message_id: String,
    /// Identity client the event is authorised for.
    pub identity_client_id: IdentityClientId,
    /// JSON-encoded event body.
    pub body: Vec<u8>,
}

impl BrokerMessage {
    /// Returns the body size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.body.len()
    }
}

/// Batch of broker messages bounded by count and total body size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBatch {
    messages: Vec<BrokerMessage>,
    max_messages: usize,
    max_bytes: usize,
    size_bytes: usize,
}

impl MessageBatch {
    /// Creates an empty batch with the given limits.
    #[must_use]
    pub const fn new(max_messages: usize, max_bytes: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
            max_bytes,
            size_bytes: 0,
        }
    }

    /// Adds a message when it fits, handing it back otherwise.
    ///
    /// # Errors
    ///
    /// Returns the rejected message when the batch is full or the message
    /// would exceed the byte limit.
    pub fn try_add(&mut self, message: BrokerMessage) -> Result<(), BrokerMessage> {
        let fits_count = self.messages.len() < self.max_messages;
        let fits_size = self
            .size_bytes
            .checked_add(message.size())
            .is_some_and(|total| total <= self.max_bytes);
        if !fits_count || !fits_size {
            return Err(message);
        }
        self.size_bytes += message.size();
        self.messages.push(message);
        Ok(())
    }

    /// Returns the batched messages.
    #[must_use]
    pub fn messages(&self) -> &[BrokerMessage] {
        &self.messages
    }

    /// Consumes the batch and returns its messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<BrokerMessage> {
        self.messages
    }

    /// Returns the number of batched messages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` when the batch holds no messages.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the total body size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}
