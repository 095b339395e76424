//! Per-node registry of lazily-created topics for one message type,
//! mirroring the `DashMap`-keyed lazy-creation pattern the broker's actor
//! registry already uses (`broker::registry::ActorRegistry`).

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::gossip::TopicTransport;
use super::topic::Topic;
use super::types::{SubscriberDelta, TopicScope};
use crate::broker::MessageBroker;
use crate::message::Message;
use crate::util::{ActorAddress, NodeAddress};

/// Owns every `(name)` topic this node has lazily created for message type
/// `M`. One registry exists per message type — a topic actor per
/// `(name, type-id)` per node — the type half of the identity is
/// carried by `M` itself rather than a runtime `TypeId` key.
pub struct TopicRegistry<M: Message, B: MessageBroker<M>, T: TopicTransport> {
    node: NodeAddress,
    broker: B,
    transport: T,
    topics: DashMap<String, Arc<Topic<M, B, T>>>,
}

impl<M: Message, B: MessageBroker<M>, T: TopicTransport + Clone> TopicRegistry<M, B, T> {
    pub fn new(node: NodeAddress, broker: B, transport: T) -> Self {
        Self {
            node,
            broker,
            transport,
            topics: DashMap::new(),
        }
    }

    /// Fetch the topic `name`, lazily creating it (with `scope`/`owner`
    /// taking effect only on first creation) if this is the first local
    /// call for it.
    pub fn get_or_create(&self, name: &str, scope: TopicScope, owner: Option<ActorAddress>) -> Arc<Topic<M, B, T>> {
        if let Some(existing) = self.topics.get(name) {
            return Arc::clone(existing.value());
        }
        let topic = Arc::new(Topic::new(
            name,
            scope,
            self.node.clone(),
            owner,
            self.broker.clone(),
            self.transport.clone(),
        ));
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| topic)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Topic<M, B, T>>> {
        self.topics.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Apply an inbound subscriber delta from a peer node, lazily creating
    /// the local mirror of the topic if this node has never touched it.
    pub fn apply_delta(&self, delta: SubscriberDelta) {
        let topic = self.get_or_create(&delta.topic, TopicScope::SystemLifetime, None);
        topic.apply_delta(&delta);
    }

    /// Notify every owner-scoped topic owned by `owner` that it has
    /// terminated: tear the topic down locally and gossip a `TopicDead`
    /// marker so peers do the same.
    pub async fn notify_owner_terminated(&self, owner: &ActorAddress, peers: &[NodeAddress]) {
        let dead: Vec<Arc<Topic<M, B, T>>> = self
            .topics
            .iter()
            .filter(|entry| entry.value().owner() == Some(owner))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for topic in dead {
            topic.mark_dead();
            let delta = topic.owner_terminated_delta();
            for peer in peers {
                let _ = self.transport.broadcast_delta(peer, delta.clone()).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ChatMessage;
    impl Message for ChatMessage {
        const MESSAGE_TYPE: &'static str = "chat_message";
    }

    #[derive(Clone, Default)]
    struct NoopTransport;

    #[async_trait::async_trait]
    impl TopicTransport for NoopTransport {
        async fn broadcast_delta(
            &self,
            _peer: &NodeAddress,
            _delta: SubscriberDelta,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }

        async fn deliver(
            &self,
            _peer: &NodeAddress,
            _topic: &str,
            _message_type: &str,
            _payload: Vec<u8>,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    fn registry() -> TopicRegistry<ChatMessage, InMemoryMessageBroker<ChatMessage>, NoopTransport> {
        TopicRegistry::new(NodeAddress::new("n1:9001"), InMemoryMessageBroker::new(), NoopTransport)
    }

    #[test]
    fn get_or_create_is_lazy_and_reuses_the_same_topic() {
        let registry = registry();
        let first = registry.get_or_create("chat", TopicScope::SystemLifetime, None);
        let second = registry.get_or_create("chat", TopicScope::ActorLifetime, Some(ActorAddress::anonymous()));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.topic_count(), 1);
    }

    #[tokio::test]
    async fn owner_terminated_tears_down_owned_topics_only() {
        let registry = registry();
        let owner = ActorAddress::named("owner-1");
        registry.get_or_create("owned-topic", TopicScope::ActorLifetime, Some(owner.clone()));
        registry.get_or_create("system-topic", TopicScope::SystemLifetime, None);

        registry.notify_owner_terminated(&owner, &[]).await;

        assert!(!registry.get("owned-topic").unwrap().is_alive());
        assert!(registry.get("system-topic").unwrap().is_alive());
    }
}
