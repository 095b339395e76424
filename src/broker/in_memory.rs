//! In-memory message broker with zero-copy routing.
//!
//! Default broker implementation using lock-free concurrent data structures
//! for high-throughput message routing between actors.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::timeout;

// Layer 3: Internal module imports
use super::error::BrokerError;
use super::registry::ActorRegistry;
use super::traits::MessageBroker;
use crate::mailbox::metrics::AtomicMetrics;
use crate::mailbox::{BoundedMailboxSender, MailboxSender};
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

/// In-memory message broker with zero-copy routing.
///
/// Default broker implementation providing high-performance message routing
/// with lock-free concurrent data structures and ownership transfer semantics.
///
/// # Performance Characteristics
///
/// - **Throughput**: >1M messages/second
/// - **Latency**: <1μs message routing overhead
/// - **Concurrency**: Lock-free operations with DashMap
/// - **Memory**: Zero-copy message transfer via ownership
///
/// # Clone Semantics
///
/// Implements cheap clone via Arc (M-SERVICES-CLONE pattern).
/// All clones share the same registry and pending request state.
///
/// # Example (System-Level Usage)
///
/// ```ignore
/// use meshcell::broker::{InMemoryMessageBroker, MessageBroker};
/// use meshcell::message::MessageEnvelope;
/// use std::time::Duration;
///
/// let broker = InMemoryMessageBroker::<MyMessage>::new();
///
/// // Register actor
/// broker.register_actor(address, mailbox_sender)?;
///
/// // Fire-and-forget
/// let envelope = MessageEnvelope::new(message).with_recipient(address);
/// broker.send(envelope).await?;
///
/// // Request-reply
/// let request = MessageEnvelope::new(query).with_recipient(address);
/// let response = broker.request::<Response>(request, Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct InMemoryMessageBroker<M: Message, S: MailboxSender<M> = BoundedMailboxSender<M, AtomicMetrics>> {
    inner: Arc<InMemoryBrokerInner<M, S>>,
}

struct InMemoryBrokerInner<M: Message, S: MailboxSender<M>> {
    /// Actor registry for address resolution
    registry: ActorRegistry<M, S>,

    /// Pending request-reply channels: correlation_id -> response sender
    pending_requests: DashMap<uuid::Uuid, oneshot::Sender<Vec<u8>>>,
}

impl<M: Message, S: MailboxSender<M>> InMemoryMessageBroker<M, S> {
    /// Create a new in-memory message broker.
    ///
    /// Initializes an empty broker with no registered actors.
    /// Actors must be registered via `register_actor()` before routing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let broker = InMemoryMessageBroker::new();
    /// ```
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryBrokerInner {
                registry: ActorRegistry::new(),
                pending_requests: DashMap::new(),
            }),
        }
    }

    /// Register an actor with the broker.
    ///
    /// Makes the actor addressable for message routing. The mailbox sender
    /// is used to deliver messages to the actor.
    ///
    /// # Arguments
    ///
    /// * `address` - Unique actor address
    /// * `sender` - Mailbox sender for message delivery
    ///
    /// # Errors
    ///
    /// Returns error if the address is already registered.
    ///
    /// # Example
    ///
    /// ```ignore
    /// broker.register_actor(address, mailbox_sender)?;
    /// ```
    pub fn register_actor(&self, address: ActorAddress, sender: S) -> Result<(), BrokerError> {
        self.inner.registry.register(address, sender)
    }

    /// Unregister an actor from the broker.
    ///
    /// Removes the actor from the routing table. Messages sent to this
    /// address after unregistration will fail with ActorNotFound error.
    ///
    /// # Arguments
    ///
    /// * `address` - Actor address to unregister
    ///
    /// # Errors
    ///
    /// Returns error if the address is not registered.
    ///
    /// # Example
    ///
    /// ```ignore
    /// broker.unregister_actor(&address)?;
    /// ```
    pub fn unregister_actor(&self, address: &ActorAddress) -> Result<(), BrokerError> {
        self.inner.registry.unregister(address)
    }

    /// Get the number of registered actors.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count = broker.actor_count();
    /// println!("Broker has {} registered actors", count);
    /// ```
    pub fn actor_count(&self) -> usize {
        self.inner.registry.actor_count()
    }

    /// Internal send implementation with reply routing.
    async fn send_impl(&self, envelope: MessageEnvelope<M>) -> Result<(), BrokerError>
    where
        M: serde::Serialize,
    {
        // Normal message routing
        let target = envelope
            .reply_to
            .clone()
            .ok_or_else(|| BrokerError::RouteError {
                message_type: M::MESSAGE_TYPE,
                reason: "Missing recipient address".to_string(),
            })?;

        // Resolve target actor
        let sender = self.inner.registry.resolve(&target)?;

        // Transfer ownership to mailbox (zero-copy)
        sender
            .send(envelope)
            .await
            .map_err(|_| BrokerError::MailboxClosed(target))?;

        Ok(())
    }

    /// Internal request implementation with timeout.
    async fn request_impl<R: Message + for<'de> serde::Deserialize<'de>>(
        &self,
        mut envelope: MessageEnvelope<M>,
        timeout_duration: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, BrokerError>
    where
        M: serde::Serialize,
    {
        // Save target address before moving envelope
        let target = envelope.reply_to.clone().unwrap_or_else(ActorAddress::anonymous);
        
        // Generate correlation ID
        let correlation_id = uuid::Uuid::new_v4();
        envelope.correlation_id = Some(correlation_id);

        // Create oneshot channel for reply
        let (tx, rx) = oneshot::channel();
        self.inner.pending_requests.insert(correlation_id, tx);

        // Send request
        self.send_impl(envelope).await?;

        // Wait for reply with timeout
        match timeout(timeout_duration, rx).await {
            Ok(Ok(serialized)) => {
                // Deserialize response
                let response: MessageEnvelope<R> =
                    serde_json::from_slice(&serialized).map_err(|e| {
                        BrokerError::RouteError {
                            message_type: R::MESSAGE_TYPE,
                            reason: format!("Failed to deserialize reply: {e}"),
                        }
                    })?;
                Ok(Some(response))
            }
            Ok(Err(_)) => {
                // Reply channel closed
                self.inner.pending_requests.remove(&correlation_id);
                Ok(None)
            }
            Err(_) => {
                // Timeout expired
                self.inner.pending_requests.remove(&correlation_id);
                Err(BrokerError::RequestTimeout {
                    target,
                    timeout: timeout_duration,
                })
            }
        }
    }

    /// Internal reply implementation: completes the oneshot registered by
    /// `request_impl` under `correlation_id`.
    async fn reply_impl<R: Message + serde::Serialize>(
        &self,
        correlation_id: uuid::Uuid,
        reply: R,
    ) -> Result<(), BrokerError> {
        let (_, sender) = self
            .inner
            .pending_requests
            .remove(&correlation_id)
            .ok_or(BrokerError::UnknownCorrelationId(correlation_id))?;

        let envelope = MessageEnvelope::new(reply);
        let serialized = serde_json::to_vec(&envelope).map_err(|error| BrokerError::RouteError {
            message_type: R::MESSAGE_TYPE,
            reason: format!("Failed to serialize reply: {error}"),
        })?;

        // The requester may have already timed out and dropped its end;
        // that's not a failure of the reply itself.
        let _ = sender.send(serialized);
        Ok(())
    }
}

#[async_trait]
impl<M: Message + serde::Serialize, S: MailboxSender<M>> MessageBroker<M>
    for InMemoryMessageBroker<M, S>
{
    type Error = BrokerError;

    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        self.send_impl(envelope).await
    }

    async fn request<R: Message + for<'de> serde::Deserialize<'de>>(
        &self,
        envelope: MessageEnvelope<M>,
        timeout: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, Self::Error> {
        self.request_impl(envelope, timeout).await
    }

    async fn reply<R: Message + serde::Serialize>(
        &self,
        correlation_id: uuid::Uuid,
        reply: R,
    ) -> Result<(), Self::Error> {
        self.reply_impl(correlation_id, reply).await
    }
}

impl<M: Message, S: MailboxSender<M>> Default for InMemoryMessageBroker<M, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mailbox::metrics::AtomicMetrics;
    use crate::mailbox::{MailboxReceiver, UnboundedMailbox};
    use crate::message::MessagePriority;
    use crate::util::ActorId;

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[allow(dead_code)]
    struct TestMessage {
        data: String,
    }

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "test_message";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct TestResponse {
        result: String,
    }

    impl Message for TestResponse {
        const MESSAGE_TYPE: &'static str = "test_response";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    type TestMailbox = UnboundedMailbox<TestMessage, AtomicMetrics>;
    type TestSender = crate::mailbox::UnboundedMailboxSender<TestMessage, AtomicMetrics>;
    type TestBroker = InMemoryMessageBroker<TestMessage, TestSender>;

    #[test]
    fn test_new_broker() {
        let broker = TestBroker::new();
        assert_eq!(broker.actor_count(), 0);
    }

    #[test]
    fn test_register_actor() {
        let broker = TestBroker::new();
        let (_receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();
        assert_eq!(broker.actor_count(), 1);
    }

    #[test]
    fn test_unregister_actor() {
        let broker = TestBroker::new();
        let (_receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();
        assert_eq!(broker.actor_count(), 1);

        broker.unregister_actor(&address).unwrap();
        assert_eq!(broker.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_send_message() {
        let broker = TestBroker::new();
        let (mut receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();

        let message = TestMessage {
            data: "hello".to_string(),
        };
        let mut envelope = MessageEnvelope::new(message);
        envelope.reply_to = Some(address);

        broker.send(envelope).await.unwrap();

        // Verify message received
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.payload.data, "hello");
    }

    #[tokio::test]
    async fn test_send_to_unknown_actor() {
        let broker = TestBroker::new();
        let address = ActorAddress::anonymous();

        let message = TestMessage {
            data: "hello".to_string(),
        };
        let mut envelope = MessageEnvelope::new(message);
        envelope.reply_to = Some(address.clone());

        let result = broker.send(envelope).await;
        assert!(matches!(result, Err(BrokerError::ActorNotFound(_))));
    }

    #[tokio::test]
    async fn test_send_without_recipient() {
        let broker = TestBroker::new();

        let message = TestMessage {
            data: "hello".to_string(),
        };
        let envelope = MessageEnvelope::new(message);

        let result = broker.send(envelope).await;
        assert!(matches!(result, Err(BrokerError::RouteError { .. })));
    }

    #[tokio::test]
    async fn test_multiple_actors() {
        let broker = TestBroker::new();

        // Register 3 actors
        let mut receivers = Vec::new();
        let mut addresses = Vec::new();

        for i in 0..3 {
            let (receiver, sender) = TestMailbox::new();
            let address = ActorAddress::Named {
                id: ActorId::new(),
                name: format!("actor-{i}"),
            };

            broker.register_actor(address.clone(), sender).unwrap();
            receivers.push(receiver);
            addresses.push(address);
        }

        assert_eq!(broker.actor_count(), 3);

        // Send message to each actor
        for (i, address) in addresses.iter().enumerate() {
            let message = TestMessage {
                data: format!("message-{i}"),
            };
            let mut envelope = MessageEnvelope::new(message);
            envelope.reply_to = Some(address.clone());
            broker.send(envelope).await.unwrap();
        }

        // Verify each actor received correct message
        for (i, receiver) in receivers.iter_mut().enumerate() {
            let received = receiver.recv().await.unwrap();
            assert_eq!(received.payload.data, format!("message-{i}"));
        }
    }

    #[tokio::test]
    async fn test_request_succeeds_when_handler_replies() {
        let broker = TestBroker::new();
        let (mut receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();

        // Stand in for the actor cell: receive the request, then reply
        // using the correlation id the request was tagged with.
        let responder_broker = broker.clone();
        tokio::spawn(async move {
            let received = receiver.recv().await.unwrap();
            let correlation_id = received.correlation_id.unwrap();
            let response = TestResponse {
                result: format!("echo:{}", received.payload.data),
            };
            responder_broker.reply(correlation_id, response).await.unwrap();
        });

        let request = TestMessage {
            data: "hello".to_string(),
        };
        let mut envelope = MessageEnvelope::new(request);
        envelope.reply_to = Some(address);

        let result: Option<MessageEnvelope<TestResponse>> = broker
            .request(envelope, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result.unwrap().payload.result, "echo:hello");
    }

    #[tokio::test]
    async fn test_reply_fails_for_unknown_correlation_id() {
        let broker = TestBroker::new();
        let response = TestResponse {
            result: "late".to_string(),
        };

        let result = broker.reply(uuid::Uuid::new_v4(), response).await;
        assert!(matches!(result, Err(BrokerError::UnknownCorrelationId(_))));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let broker = TestBroker::new();
        let (_receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();

        let request = TestMessage {
            data: "request".to_string(),
        };
        let mut envelope = MessageEnvelope::new(request);
        envelope.reply_to = Some(address);

        // Request with very short timeout (actor won't reply)
        let result: Result<Option<MessageEnvelope<TestResponse>>, _> =
            broker.request(envelope, Duration::from_millis(10)).await;

        // Should timeout since no actor is processing and replying
        match result {
            Err(BrokerError::RequestTimeout { .. }) => {
                // Test passed
            }
            other => {
                panic!("Expected RequestTimeout, got: {:?}", other);
            }
        }
    }

    #[tokio::test]
    async fn test_broker_clone() {
        let broker = TestBroker::new();
        let (_receiver, sender) = TestMailbox::new();
        let address = ActorAddress::anonymous();

        broker.register_actor(address.clone(), sender).unwrap();

        // Clone shares same registry
        let broker_clone = broker.clone();
        assert_eq!(broker_clone.actor_count(), 1);
    }
}
