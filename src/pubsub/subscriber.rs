//! RAII subscription handle: unsubscribes on drop so a subscriber that
//! terminates without explicitly unsubscribing can't leak a dangling
//! entry in the topic's subscriber set.
//!
//! `ActorContext` tracks children via explicit registration rather than a
//! generic watch mechanism; `Subscription`'s `Drop` impl is this crate's
//! equivalent for a set membership that isn't a parent/child relationship.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::runtime::Handle;

// Layer 3: Internal module imports
use super::gossip::TopicTransport;
use super::topic::Topic;
use crate::broker::MessageBroker;
use crate::message::Message;
use crate::util::{ActorAddress, NodeAddress};

/// An active subscription to a topic. Dropping it unsubscribes, spawning
/// the (fire-and-forget) replication call on the ambient Tokio runtime.
pub struct Subscription<M: Message, B: MessageBroker<M>, T: TopicTransport> {
    topic: Arc<Topic<M, B, T>>,
    subscriber: ActorAddress,
    peers: Vec<NodeAddress>,
}

impl<M: Message, B: MessageBroker<M>, T: TopicTransport> Subscription<M, B, T> {
    /// Subscribe `subscriber` to `topic`, returning a guard that
    /// unsubscribes on drop. `peers` is the peer set to replicate
    /// subscribe/unsubscribe deltas to.
    pub async fn new(topic: Arc<Topic<M, B, T>>, subscriber: ActorAddress, peers: Vec<NodeAddress>) -> Self {
        topic.subscribe(subscriber.clone(), &peers).await;
        Self {
            topic,
            subscriber,
            peers,
        }
    }

    pub fn subscriber(&self) -> &ActorAddress {
        &self.subscriber
    }
}

impl<M: Message, B: MessageBroker<M>, T: TopicTransport> Drop for Subscription<M, B, T> {
    fn drop(&mut self) {
        let topic = Arc::clone(&self.topic);
        let subscriber = self.subscriber.clone();
        let peers = self.peers.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                topic.unsubscribe(&subscriber, &peers).await;
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::gossip::test_support::RecordingTopicTransport;
    use super::super::types::TopicScope;
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ChatMessage;
    impl Message for ChatMessage {
        const MESSAGE_TYPE: &'static str = "chat_message";
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let topic = Arc::new(Topic::<ChatMessage, _, _>::new(
            "chat",
            TopicScope::SystemLifetime,
            NodeAddress::new("n1:9001"),
            None,
            InMemoryMessageBroker::new(),
            RecordingTopicTransport::default(),
        ));
        let subscriber = ActorAddress::named("sub-1");

        let subscription = Subscription::new(Arc::clone(&topic), subscriber, Vec::new()).await;
        assert_eq!(topic.local_subscriber_count(), 1);

        drop(subscription);
        // Unsubscribe is spawned onto the runtime; yield so it can run.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(topic.local_subscriber_count(), 0);
    }
}
