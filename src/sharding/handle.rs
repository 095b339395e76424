//! Fluent handle over a [`ShardRegion`]: `region.entity(id).tell(msg)`,
//! matching the consuming-`self` builder style of
//! `system::builder::ActorSpawnBuilder` and `ask::AskBuilder`.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::error::ShardingError;
use super::region::ShardRegion;
use super::types::ShardId;
use crate::actor::Actor;
use crate::broker::MessageBroker;
use crate::message::MessageEnvelope;

/// A cloneable, `Arc`-backed wrapper around a [`ShardRegion`] for
/// application code that wants `region.entity(id)` rather than building
/// envelopes by hand.
pub struct ShardedRegionHandle<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
{
    region: Arc<ShardRegion<A, B, F, X>>,
}

impl<A, B, F, X> ShardedRegionHandle<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
{
    pub fn new(region: ShardRegion<A, B, F, X>) -> Self {
        Self {
            region: Arc::new(region),
        }
    }

    /// Bind a single entity id for subsequent `tell`/`shard_id` calls.
    pub fn entity(&self, entity_id: impl Into<String>) -> EntityHandle<A, B, F, X> {
        EntityHandle {
            region: Arc::clone(&self.region),
            entity_id: entity_id.into(),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.region.entity_count()
    }
}

impl<A, B, F, X> Clone for ShardedRegionHandle<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            region: Arc::clone(&self.region),
        }
    }
}

/// A handle bound to one entity id, ready to route messages to it.
pub struct EntityHandle<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
{
    region: Arc<ShardRegion<A, B, F, X>>,
    entity_id: String,
}

impl<A, B, F, X> EntityHandle<A, B, F, X>
where
    A: Actor,
    B: MessageBroker<A::Message>,
    F: Fn() -> A + Send + Sync + 'static,
    X: super::entity::MessageExtractor<A::Message>,
{
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn shard_id(&self) -> ShardId {
        self.region.shard_for(&self.entity_id)
    }

    /// Fire-and-forget delivery to this entity, activating it on first
    /// delivery (per [`ShardRegion::send`]).
    pub async fn tell(&self, message: A::Message) -> Result<(), ShardingError>
    where
        A::Message: serde::Serialize,
    {
        let envelope = MessageEnvelope::new(message).with_entity_id(self.entity_id.clone());
        self.region.send(envelope).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actor::ActorContext;
    use crate::broker::InMemoryMessageBroker;
    use crate::cluster::Membership;
    use crate::message::Message;
    use crate::sharding::coordinator::ShardCoordinator;
    use crate::util::NodeAddress;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    struct EchoEntity;

    #[async_trait]
    impl Actor for EchoEntity {
        type Message = Ping;
        type Error = std::io::Error;

        async fn handle_message<Br: MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, Br>,
        ) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn region(node: NodeAddress) -> ShardRegion<EchoEntity, InMemoryMessageBroker<Ping>, impl Fn() -> EchoEntity> {
        let broker = InMemoryMessageBroker::<Ping>::new();
        let membership = Arc::new(Membership::new(node.clone(), Default::default()));
        let coordinator = Arc::new(ShardCoordinator::new(8, None));
        ShardRegion::new(
            node,
            8,
            broker,
            || EchoEntity,
            Duration::from_secs(30),
            coordinator,
            membership,
            "echo",
        )
    }

    #[tokio::test]
    async fn entity_handle_tells_and_reuses_activation() {
        let handle = ShardedRegionHandle::new(region(NodeAddress::new("n1:9001")));

        let entity = handle.entity("w-1");
        entity.tell(Ping).await.unwrap();
        assert_eq!(handle.entity_count(), 1);

        handle.entity("w-1").tell(Ping).await.unwrap();
        assert_eq!(handle.entity_count(), 1);
    }

    #[tokio::test]
    async fn shard_id_is_deterministic_for_an_entity_id() {
        let handle = ShardedRegionHandle::new(region(NodeAddress::new("n1:9001")));

        let a = handle.entity("w-1").shard_id();
        let b = handle.entity("w-1").shard_id();
        assert_eq!(a, b);
    }
}
