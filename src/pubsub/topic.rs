//! A single `(name, message type)` topic actor's local state: subscriber
//! set, owner-scoped liveness, and publish fan-out to local subscribers plus
//! one deputy per remote node known to have subscribers.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};

// Layer 2: Third-party crate imports
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use tracing::warn;

// Layer 3: Internal module imports
use super::gossip::TopicTransport;
use super::types::{SubscriberDelta, TopicScope};
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::util::{ActorAddress, NodeAddress};

/// Per-node state for one `(name, message type)` topic. `M` fixes the
/// message type at compile time, so topic identity only needs to track
/// `name` at runtime rather than a runtime type id (§6.2).
pub struct Topic<M: Message, B: MessageBroker<M>, T: TopicTransport> {
    name: String,
    scope: TopicScope,
    node: NodeAddress,
    owner: Option<ActorAddress>,
    broker: B,
    transport: T,
    local_subscribers: DashSet<ActorAddress>,
    remote_nodes: DashSet<NodeAddress>,
    alive: AtomicBool,
    _marker: std::marker::PhantomData<fn(M)>,
}

impl<M: Message, B: MessageBroker<M>, T: TopicTransport> Topic<M, B, T> {
    pub fn new(
        name: impl Into<String>,
        scope: TopicScope,
        node: NodeAddress,
        owner: Option<ActorAddress>,
        broker: B,
        transport: T,
    ) -> Self {
        Self {
            name: name.into(),
            scope,
            node,
            owner,
            broker,
            transport,
            local_subscribers: DashSet::new(),
            remote_nodes: DashSet::new(),
            alive: AtomicBool::new(true),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> TopicScope {
        self.scope
    }

    pub fn owner(&self) -> Option<&ActorAddress> {
        self.owner.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn local_subscriber_count(&self) -> usize {
        self.local_subscribers.len()
    }

    /// Add `subscriber` if not already present, replicating the change to
    /// every peer this node is gossiping with. Duplicate `subscribe` is a
    /// no-op.
    pub async fn subscribe(&self, subscriber: ActorAddress, peers: &[NodeAddress]) -> bool {
        if !self.is_alive() {
            return false;
        }
        let inserted = self.local_subscribers.insert(subscriber.clone());
        if inserted {
            self.replicate(vec![subscriber], Vec::new(), peers).await;
        }
        inserted
    }

    /// Remove `subscriber` if present, replicating the change. A no-op if
    /// the subscriber was never present.
    pub async fn unsubscribe(&self, subscriber: &ActorAddress, peers: &[NodeAddress]) -> bool {
        let removed = self.local_subscribers.remove(subscriber).is_some();
        if removed {
            self.replicate(Vec::new(), vec![subscriber.clone()], peers).await;
        }
        removed
    }

    async fn replicate(&self, added: Vec<ActorAddress>, removed: Vec<ActorAddress>, peers: &[NodeAddress]) {
        let delta = SubscriberDelta {
            topic: self.name.clone(),
            message_type: M::MESSAGE_TYPE.to_string(),
            node: self.node.clone(),
            added,
            removed,
            now_empty: self.local_subscribers.is_empty(),
            owner_terminated: false,
        };
        for peer in peers {
            if peer == &self.node {
                continue;
            }
            if let Err(error) = self.transport.broadcast_delta(peer, delta.clone()).await {
                warn!(topic = %self.name, %peer, %error, "subscriber delta replication failed");
            }
        }
    }

    /// Fan out `message` to every local subscriber (in order, so per-
    /// subscriber ordering from this publisher is preserved) and to one
    /// deputy per remote node known to have subscribers. Silently dropped
    /// if the topic's owner has already terminated.
    pub async fn publish(&self, message: M) -> Result<(), super::error::TopicError>
    where
        M: Serialize + Clone,
    {
        if !self.is_alive() {
            return Ok(());
        }

        for subscriber in self.local_subscribers.iter() {
            let subscriber = subscriber.clone();
            let envelope = MessageEnvelope::new(message.clone()).with_reply_to(subscriber.clone());
            if let Err(error) = self.broker.send(envelope).await {
                warn!(topic = %self.name, subscriber = %subscriber, %error, "topic delivery to subscriber failed");
            }
        }

        let payload = serde_json::to_vec(&message).map_err(|error| super::error::TopicError::DeliveryFailed {
            topic: self.name.clone(),
            subscriber: "<remote fan-out>".to_string(),
            source: Box::new(error),
        })?;

        for node in self.remote_nodes.iter() {
            let node = node.clone();
            if let Err(error) = self
                .transport
                .deliver(&node, &self.name, M::MESSAGE_TYPE, payload.clone())
                .await
            {
                warn!(topic = %self.name, peer = %node, %error, "remote topic fan-out failed");
            }
        }

        Ok(())
    }

    /// Apply a subscriber delta gossiped from another node's topic actor.
    pub fn apply_delta(&self, delta: &SubscriberDelta) {
        if delta.owner_terminated {
            self.mark_dead();
            return;
        }
        if delta.now_empty {
            self.remote_nodes.remove(&delta.node);
        } else if !delta.added.is_empty() {
            self.remote_nodes.insert(delta.node.clone());
        }
    }

    /// Tear the topic down: clear subscribers, stop accepting publishes.
    /// Called when this topic's own owner terminates, or when a peer's
    /// `owner_terminated` delta arrives for an owner-scoped topic mirrored
    /// on this node.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
        self.local_subscribers.clear();
        self.remote_nodes.clear();
    }

    /// The owner-terminated delta this topic should gossip to peers, if it
    /// is owner-scoped and its owner just stopped.
    pub fn owner_terminated_delta(&self) -> SubscriberDelta {
        SubscriberDelta::owner_terminated(self.name.clone(), M::MESSAGE_TYPE, self.node.clone())
    }
}

/// Handy alias so `TopicRegistry` doesn't need to restate the bound set.
pub(crate) type TopicMap<M, B, T> = DashMap<String, std::sync::Arc<Topic<M, B, T>>>;
