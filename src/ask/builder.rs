//! Fluent one-shot request/reply builder: binds a target and timeout
//! before a terminal `execute()`, mirroring `ActorSpawnBuilder`'s
//! consuming-`self` style.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::error::AskError;
use crate::actor::ActorContext;
use crate::broker::MessageBroker;
use crate::message::Message;
use crate::util::ActorAddress;

/// Deadline used when a caller never calls `with_timeout` — every ask
/// still has a mandatory deadline; this is just the default one.
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(5);

/// A long enough internal bound that the broker's own `request` almost
/// never races this builder's deadline; the builder's own timer, not the
/// broker's, is the authoritative source of `AskError::Timeout`.
const INTERNAL_REQUEST_CEILING: Duration = Duration::from_secs(3600);

/// Binds a reply target, message, and deadline before the terminal
/// `execute()` call.
pub struct AskBuilder<'ctx, M: Message, B: MessageBroker<M>> {
    context: &'ctx ActorContext<M, B>,
    target: ActorAddress,
    message: M,
    timeout: Duration,
}

impl<'ctx, M: Message, B: MessageBroker<M>> AskBuilder<'ctx, M, B> {
    pub fn new(context: &'ctx ActorContext<M, B>, target: ActorAddress, message: M) -> Self {
        Self {
            context,
            target,
            message,
            timeout: DEFAULT_ASK_TIMEOUT,
        }
    }

    /// Override the deadline (consuming builder style).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the request and await a reply of type `R`, failing with
    /// [`AskError::Timeout`] if `timeout` elapses first.
    pub async fn execute<R>(self) -> Result<R, AskError>
    where
        M: Serialize,
        R: Message + for<'de> Deserialize<'de>,
    {
        let reply = tokio::time::timeout(
            self.timeout,
            self.context.request::<R>(self.target, self.message, INTERNAL_REQUEST_CEILING),
        )
        .await;

        match reply {
            Ok(Ok(Some(envelope))) => Ok(envelope.payload),
            Ok(Ok(None)) => Err(AskError::NoReply),
            Ok(Err(error)) => Err(AskError::Broker {
                source: Box::new(error),
            }),
            Err(_elapsed) => Err(AskError::Timeout { deadline: self.timeout }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use crate::mailbox::metrics::AtomicMetrics;
    use crate::mailbox::{UnboundedMailbox, UnboundedMailboxSender};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Pong;
    impl Message for Pong {
        const MESSAGE_TYPE: &'static str = "pong";
    }

    type TestBroker = InMemoryMessageBroker<Ping, UnboundedMailboxSender<Ping, AtomicMetrics>>;

    #[tokio::test]
    async fn execute_times_out_when_nobody_replies() {
        let broker = TestBroker::new();
        let (_receiver, sender) = UnboundedMailbox::<Ping, AtomicMetrics>::new();
        let target = ActorAddress::anonymous();
        broker.register_actor(target.clone(), sender).unwrap();

        let ctx = ActorContext::new(ActorAddress::anonymous(), broker);
        let result = AskBuilder::<Ping, TestBroker>::new(&ctx, target, Ping)
            .with_timeout(Duration::from_millis(20))
            .execute::<Pong>()
            .await;

        assert!(matches!(result, Err(AskError::Timeout { .. })));
    }

    #[tokio::test]
    async fn execute_resolves_when_the_target_replies() {
        let broker = TestBroker::new();
        let (mut mailbox, sender) = UnboundedMailbox::<Ping, AtomicMetrics>::new();
        let target = ActorAddress::anonymous();
        broker.register_actor(target.clone(), sender).unwrap();

        // Stand in for the target actor's cell: receive the request and
        // reply via the context, the same path `Actor::handle_message`
        // implementations use.
        let mut responder_context = ActorContext::new(target.clone(), broker.clone());
        tokio::spawn(async move {
            let envelope = mailbox.recv().await.unwrap();
            responder_context.set_current_correlation_id(envelope.correlation_id);
            responder_context.reply(Pong).await.unwrap();
        });

        let ctx = ActorContext::new(ActorAddress::anonymous(), broker);
        let result = AskBuilder::<Ping, TestBroker>::new(&ctx, target, Ping)
            .with_timeout(Duration::from_secs(1))
            .execute::<Pong>()
            .await;

        assert!(matches!(result, Ok(Pong)));
    }

    #[tokio::test]
    async fn execute_fails_with_broker_error_when_target_missing() {
        let broker = TestBroker::new();
        let ctx = ActorContext::new(ActorAddress::anonymous(), broker);
        let missing_target = ActorAddress::anonymous();

        let result = AskBuilder::<Ping, TestBroker>::new(&ctx, missing_target, Ping)
            .with_timeout(Duration::from_millis(50))
            .execute::<Pong>()
            .await;

        assert!(matches!(result, Err(AskError::Broker { .. })));
    }
}
