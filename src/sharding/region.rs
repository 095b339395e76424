//! Per-node shard region: lazily activates entities and routes envelopes
//! to them by entity id.

// Layer 1: Standard library imports
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::info;

// Layer 3: Internal module imports
use super::coordinator::ShardCoordinator;
use super::entity::{DefaultExtractor, MessageExtractor};
use super::error::ShardingError;
use super::shard_id::shard_id_for;
use super::types::ShardId;
use crate::actor::{Actor, ActorCell, ActorContext};
use crate::broker::MessageBroker;
use crate::cluster::Membership;
use crate::message::{Message, MessageEnvelope};
use crate::remote::{Frame, Transport};
use crate::util::{ActorAddress, ActorPath, NodeAddress};

/// One node's share of an entity type's address space.
///
/// `F` is the entity factory, matching `ChildSpec<C, F>`'s factory-function
/// generic rather than a boxed closure (§6.2). `X` is the entity id
/// extractor, defaulted to [`DefaultExtractor`].
pub struct ShardRegion<A, B, F, X = DefaultExtractor>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
{
    node: NodeAddress,
    num_shards: u32,
    broker: B,
    factory: F,
    passivate_after: Duration,
    region_name: String,
    coordinator: Arc<ShardCoordinator>,
    membership: Arc<Membership>,
    transport: Option<Arc<dyn Transport>>,
    entities: Arc<DashMap<String, UnboundedSender<MessageEnvelope<A::Message>>>>,
    _extractor: PhantomData<X>,
}

impl<A, B, F, X> ShardRegion<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
    X: MessageExtractor<A::Message>,
    A::Message: Message,
{
    /// Build a region for entity type `region_name`, backed by `coordinator`
    /// for ownership lookups and `membership` for placement eligibility.
    /// Remote forwarding is disabled until [`Self::with_transport`] is
    /// called; a region with no transport returns
    /// [`ShardingError::ShardUnavailable`] for any shard it doesn't own.
    pub fn new(
        node: NodeAddress,
        num_shards: u32,
        broker: B,
        factory: F,
        passivate_after: Duration,
        coordinator: Arc<ShardCoordinator>,
        membership: Arc<Membership>,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            node,
            num_shards,
            broker,
            factory,
            passivate_after,
            region_name: region_name.into(),
            coordinator,
            membership,
            transport: None,
            entities: Arc::new(DashMap::new()),
            _extractor: PhantomData,
        }
    }

    /// Enable forwarding to remote shard owners over `transport`.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn shard_for(&self, entity_id: &str) -> ShardId {
        shard_id_for(entity_id, self.num_shards)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Route `envelope` to the entity it targets: the coordinator is
    /// consulted for the owning node first, then the message either
    /// activates (or reuses) the entity locally, forwards to the remote
    /// owner over `transport`, or fails with
    /// [`ShardingError::ShardUnavailable`] if ownership can't be resolved.
    pub async fn send(&self, envelope: MessageEnvelope<A::Message>) -> Result<(), ShardingError>
    where
        A::Message: serde::Serialize,
    {
        let entity_id = X::extract_entity_id(&envelope).ok_or(ShardingError::MissingEntityId)?;
        let shard_id = self.shard_for(&entity_id);

        let owner = self
            .coordinator
            .request_allocation(shard_id, &self.membership)
            .map_err(|_| ShardingError::ShardUnavailable { shard_id })?;

        if owner == self.node {
            self.send_local(entity_id, envelope)
        } else {
            self.forward_remote(&owner, shard_id, entity_id, envelope).await
        }
    }

    fn send_local(&self, entity_id: String, envelope: MessageEnvelope<A::Message>) -> Result<(), ShardingError> {
        let sender = self.entities.get(&entity_id).map(|e| e.value().clone());
        let sender = match sender {
            Some(sender) => sender,
            None => self.activate(entity_id.clone())?,
        };

        sender
            .send(envelope)
            .map_err(|_| ShardingError::DeliveryFailed { entity_id })
    }

    async fn forward_remote(
        &self,
        owner: &NodeAddress,
        shard_id: ShardId,
        entity_id: String,
        envelope: MessageEnvelope<A::Message>,
    ) -> Result<(), ShardingError>
    where
        A::Message: serde::Serialize,
    {
        let transport = self
            .transport
            .as_ref()
            .ok_or(ShardingError::ShardUnavailable { shard_id })?;

        let payload = serde_json::to_vec(&envelope).map_err(|error| ShardingError::RemoteForwardFailed {
            entity_id: entity_id.clone(),
            reason: format!("failed to encode envelope: {error}"),
        })?;

        let destination_path = ActorPath::system(format!("shard-{}", self.region_name)).child(entity_id.clone());
        let frame = Frame::new(destination_path, "json", payload);

        transport
            .send(owner, frame)
            .await
            .map_err(|error| ShardingError::RemoteForwardFailed {
                entity_id,
                reason: error.to_string(),
            })
    }

    fn activate(&self, entity_id: String) -> Result<UnboundedSender<MessageEnvelope<A::Message>>, ShardingError> {
        let actor = (self.factory)();
        let address = ActorAddress::named(format!("entity:{entity_id}"));
        let context = ActorContext::new(address, self.broker.clone());

        let (sender, mut mailbox) = mpsc::unbounded_channel();
        self.entities.insert(entity_id.clone(), sender.clone());

        let passivate_after = self.passivate_after;
        let entities = Arc::clone(&self.entities);
        let activated_id = entity_id.clone();
        let node = self.node.clone();

        tokio::spawn(async move {
            let mut cell = ActorCell::new(actor, context);
            cell.run_with_idle_timeout(&mut mailbox, passivate_after).await;
            entities.remove(&activated_id);
            info!(%node, entity_id = %activated_id, "entity passivated");
        });

        Ok(sender)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actor::ActorContext as Ctx;
    use crate::broker::InMemoryMessageBroker;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    #[derive(Debug)]
    struct NeverFails;
    impl std::fmt::Display for NeverFails {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "never fails")
        }
    }
    impl std::error::Error for NeverFails {}

    struct EchoEntity;

    #[async_trait]
    impl Actor for EchoEntity {
        type Message = Ping;
        type Error = NeverFails;

        async fn handle_message<Br: MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut Ctx<Self::Message, Br>,
        ) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn send_activates_entity_lazily_and_reuses_it() {
        let node = NodeAddress::new("n1:9001");
        let broker = InMemoryMessageBroker::<Ping>::new();
        let membership = Arc::new(Membership::new(node.clone(), Default::default()));
        let coordinator = Arc::new(ShardCoordinator::new(8, None));
        let region = ShardRegion::new(
            node,
            8,
            broker,
            || EchoEntity,
            Duration::from_secs(30),
            coordinator,
            membership,
            "echo",
        );

        let envelope = MessageEnvelope::new(Ping).with_entity_id("w-1");
        region.send(envelope).await.unwrap();
        assert_eq!(region.entity_count(), 1);

        let envelope2 = MessageEnvelope::new(Ping).with_entity_id("w-1");
        region.send(envelope2).await.unwrap();
        assert_eq!(region.entity_count(), 1);
    }

    #[tokio::test]
    async fn send_without_entity_id_errors() {
        let node = NodeAddress::new("n1:9001");
        let broker = InMemoryMessageBroker::<Ping>::new();
        let membership = Arc::new(Membership::new(node.clone(), Default::default()));
        let coordinator = Arc::new(ShardCoordinator::new(8, None));
        let region = ShardRegion::new(
            node,
            8,
            broker,
            || EchoEntity,
            Duration::from_secs(30),
            coordinator,
            membership,
            "echo",
        );

        let err = region.send(MessageEnvelope::new(Ping)).await.unwrap_err();
        assert!(matches!(err, ShardingError::MissingEntityId));
    }

    #[tokio::test]
    async fn send_to_a_shard_with_no_eligible_node_is_shard_unavailable() {
        // No members registered with the role the coordinator filters on,
        // so allocation can never succeed.
        let node = NodeAddress::new("n1:9001");
        let broker = InMemoryMessageBroker::<Ping>::new();
        let membership = Arc::new(Membership::new(node.clone(), Default::default()));
        let coordinator = Arc::new(ShardCoordinator::new(8, Some("entities".to_string())));
        let region = ShardRegion::new(
            node,
            8,
            broker,
            EchoEntity::factory,
            Duration::from_secs(30),
            coordinator,
            membership,
            "echo",
        );

        let envelope = MessageEnvelope::new(Ping).with_entity_id("w-1");
        let err = region.send(envelope).await.unwrap_err();
        assert!(matches!(err, ShardingError::ShardUnavailable { .. }));
    }
}
