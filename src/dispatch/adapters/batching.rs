//! Event dispatcher that packs events into size-bounded broker batches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::SchedulerSettings;
use crate::dispatch::{
    domain::{BrokerMessage, DispatchEvent, IdentityClientId, MessageBatch},
    ports::{EventDispatchError, EventDispatchResult, EventDispatcher, MessageBroker},
};

/// Wire format of a broker message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Identity client the event is authorised for.
    pub identity_client_id: IdentityClientId,
    /// The outbound call.
    pub event: DispatchEvent,
}

/// [`EventDispatcher`] that serialises events and sends them through a
/// [`MessageBroker`] in batches.
#[derive(Debug, Clone)]
pub struct BatchingEventDispatcher<B>
where
    B: MessageBroker,
{
    broker: Arc<B>,
    max_messages: usize,
    max_bytes: usize,
}

impl<B> BatchingEventDispatcher<B>
where
    B: MessageBroker,
{
    /// Creates a dispatcher with explicit batch limits.
    #[must_use]
    pub const fn new(broker: Arc<B>, max_messages: usize, max_bytes: usize) -> Self {
        Self {
            broker,
            max_messages,
            max_bytes,
        }
    }

    /// Creates a dispatcher using the batch limits from `settings`.
    #[must_use]
    pub const fn from_settings(broker: Arc<B>, settings: &SchedulerSettings) -> Self {
        Self::new(
            broker,
            settings.dispatch_batch_size,
            settings.dispatch_batch_max_bytes,
        )
    }

    const fn empty_batch(&self) -> MessageBatch {
        MessageBatch::new(self.max_messages, self.max_bytes)
    }

    async fn send(
        &self,
        batch: MessageBatch,
        client_id: &IdentityClientId,
    ) -> EventDispatchResult<()> {
        let batch_len = batch.len();
        tracing::debug!(
            identity_client_id = %client_id,
            batch_len,
            size_bytes = batch.size_bytes(),
            "sending event batch"
        );
        self.broker
            .send_batch(batch)
            .await
            .map_err(|source| EventDispatchError::Batch { batch_len, source })
    }

    fn too_large(&self, event_key: String, size_bytes: usize) -> EventDispatchError {
        EventDispatchError::MessageTooLarge {
            event_key,
            size_bytes,
            limit_bytes: self.max_bytes,
        }
    }
}

#[async_trait]
impl<B> EventDispatcher for BatchingEventDispatcher<B>
where
    B: MessageBroker,
{
    async fn dispatch_many(
        &self,
        events: Vec<DispatchEvent>,
        identity_client_id: &IdentityClientId,
    ) -> EventDispatchResult<()> {
        let mut batch = self.empty_batch();
        for event in events {
            let event_key = event.event_key.clone();
            let message = encode(event, identity_client_id)?;
            let Err(rejected) = batch.try_add(message) else {
                continue;
            };
            if batch.is_empty() {
                return Err(self.too_large(event_key, rejected.size()));
            }
            let full = std::mem::replace(&mut batch, self.empty_batch());
            self.send(full, identity_client_id).await?;
            if let Err(oversized) = batch.try_add(rejected) {
                return Err(self.too_large(event_key, oversized.size()));
            }
        }
        if !batch.is_empty() {
            self.send(batch, identity_client_id).await?;
        }
        Ok(())
    }
}

fn encode(
    event: DispatchEvent,
    identity_client_id: &IdentityClientId,
) -> EventDispatchResult<BrokerMessage> {
    let message_id = message_id(&event);
    let event_key = event.event_key.clone();
    let envelope = EventEnvelope {
        identity_client_id: identity_client_id.clone(),
        event,
    };
    let body = serde_json::to_vec(&envelope).map_err(|err| EventDispatchError::Encoding {
        event_key,
        reason: err.to_string(),
    })?;
    Ok(BrokerMessage {
        message_id,
        identity_client_id: identity_client_id.clone(),
        body,
    })
}

/// Derives a stable message identifier from the event key and invocation.
fn message_id(event: &DispatchEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event.event_key.as_bytes());
    hasher.update(b":");
    hasher.update(event.invocation_id.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{
        adapters::memory::InMemoryMessageBroker,
        domain::{HttpMethod, InvocationId},
    };
    use rstest::rstest;
    use serde_json::json;

    fn event(key: &str, body_len: usize) -> DispatchEvent {
        DispatchEvent::new(
            "https://api.example.test/run",
            HttpMethod::Post,
            Some(json!({ "blob": "x".repeat(body_len) })),
            key,
            InvocationId::new(),
        )
    }

    fn client() -> IdentityClientId {
        IdentityClientId::from("jobs-client")
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn chunks_events_by_message_count() {
        let broker = Arc::new(InMemoryMessageBroker::new());
        let dispatcher = BatchingEventDispatcher::new(broker.clone(), 10, 1024 * 1024);
        let events = (0..23).map(|i| event(&format!("task-{i}"), 8)).collect();

        dispatcher
            .dispatch_many(events, &client())
            .await
            .expect("dispatch should succeed");

        let sizes: Vec<usize> = broker.batches().iter().map(MessageBatch::len).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn oversized_event_is_a_hard_error() {
        let broker = Arc::new(InMemoryMessageBroker::new());
        let dispatcher = BatchingEventDispatcher::new(broker.clone(), 10, 1024);

        let result = dispatcher
            .dispatch_many(vec![event("huge", 4096)], &client())
            .await;

        assert!(matches!(
            result,
            Err(EventDispatchError::MessageTooLarge { ref event_key, .. }) if event_key == "huge"
        ));
        assert!(broker.batches().is_empty());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn broker_rejection_propagates() {
        let broker = Arc::new(InMemoryMessageBroker::new());
        broker.reject_batches(true);
        let dispatcher = BatchingEventDispatcher::new(broker.clone(), 10, 1024 * 1024);

        let result = dispatcher
            .dispatch_one(event("task", 8), &client())
            .await;

        assert!(matches!(
            result,
            Err(EventDispatchError::Batch { batch_len: 1, .. })
        ));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn envelopes_round_trip_through_broker() {
        let broker = Arc::new(InMemoryMessageBroker::new());
        let dispatcher = BatchingEventDispatcher::new(broker.clone(), 10, 1024 * 1024);
        let sent = event("task-a", 4);

        dispatcher
            .dispatch_one(sent.clone(), &client())
            .await
            .expect("dispatch should succeed");

        let envelopes = broker.sent_envelopes().expect("envelopes should decode");
        assert_eq!(
            envelopes,
            vec![EventEnvelope {
                identity_client_id: client(),
                event: sent,
            }]
        );
    }

    #[rstest]
    fn message_id_is_deterministic() {
        let sent = event("task-a", 4);
        assert_eq!(message_id(&sent), message_id(&sent.clone()));
        assert_eq!(message_id(&sent).len(), 64);
    }
}
