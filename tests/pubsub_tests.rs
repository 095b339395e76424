//! Integration tests for distributed pub/sub: local fan-out, registry
//! lazy-creation, and owner-scoped topic teardown.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use meshcell::broker::InMemoryMessageBroker;
use meshcell::pubsub::{SubscriberDelta, TopicRegistry, TopicScope, TopicTransport};
use meshcell::util::{ActorAddress, NodeAddress};
use meshcell::Message;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PriceUpdate {
    symbol: String,
}

impl Message for PriceUpdate {
    const MESSAGE_TYPE: &'static str = "price_update";
}

#[derive(Clone, Default)]
struct NoopTransport;

#[async_trait]
impl TopicTransport for NoopTransport {
    async fn broadcast_delta(
        &self,
        _peer: &NodeAddress,
        _delta: SubscriberDelta,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    async fn deliver(
        &self,
        _peer: &NodeAddress,
        _topic: &str,
        _message_type: &str,
        _payload: Vec<u8>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

fn registry() -> TopicRegistry<PriceUpdate, InMemoryMessageBroker<PriceUpdate>, NoopTransport> {
    TopicRegistry::new(
        NodeAddress::new("n1:9001"),
        InMemoryMessageBroker::new(),
        NoopTransport,
    )
}

#[tokio::test]
async fn get_or_create_is_idempotent_per_name() {
    let registry = registry();
    let a = registry.get_or_create("quotes", TopicScope::SystemLifetime, None);
    let b = registry.get_or_create("quotes", TopicScope::SystemLifetime, None);
    assert_eq!(registry.topic_count(), 1);
    assert_eq!(a.name(), b.name());
}

#[tokio::test]
async fn subscribing_twice_is_a_no_op() {
    let registry = registry();
    let topic = registry.get_or_create("quotes", TopicScope::SystemLifetime, None);
    let subscriber = ActorAddress::anonymous();

    assert!(topic.subscribe(subscriber.clone(), &[]).await);
    assert!(!topic.subscribe(subscriber.clone(), &[]).await);
    assert_eq!(topic.local_subscriber_count(), 1);
}

#[tokio::test]
async fn owner_terminated_topic_stops_accepting_publishes() {
    let owner = ActorAddress::anonymous();
    let registry = registry();
    let topic = registry.get_or_create("quotes", TopicScope::ActorLifetime, Some(owner.clone()));
    topic.subscribe(ActorAddress::anonymous(), &[]).await;

    registry.notify_owner_terminated(&owner, &[]).await;

    assert!(!topic.is_alive());
    assert_eq!(topic.local_subscriber_count(), 0);
    topic
        .publish(PriceUpdate {
            symbol: "ACME".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn apply_delta_tracks_remote_deputies() {
    let registry = registry();
    let topic = registry.get_or_create("quotes", TopicScope::SystemLifetime, None);

    let remote = NodeAddress::new("n2:9001");
    registry.apply_delta(SubscriberDelta {
        topic: "quotes".to_string(),
        message_type: PriceUpdate::MESSAGE_TYPE.to_string(),
        node: remote.clone(),
        added: vec![ActorAddress::anonymous()],
        removed: Vec::new(),
        now_empty: false,
        owner_terminated: false,
    });

    topic
        .publish(PriceUpdate {
            symbol: "ACME".to_string(),
        })
        .await
        .unwrap();
}
