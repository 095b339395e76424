//! Cross-node transport for subscriber-set deltas and remote fan-out
//! delivery, following the same shape as `cluster::gossip::GossipTransport`
//! (a thin async trait the real transport module implements, with an
//! in-memory stand-in for tests).

// Layer 1: Standard library imports
use std::error::Error;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::types::SubscriberDelta;
use crate::util::NodeAddress;

/// Replicates subscriber-set changes and deputizes remote fan-out for a
/// topic. `deliver` carries an already-encoded payload (the topic's codec
/// is chosen by its message type, not by this trait) to the named topic on
/// `peer`, where a local deputy fans it out to that node's subscribers.
#[async_trait]
pub trait TopicTransport: Send + Sync + 'static {
    async fn broadcast_delta(
        &self,
        peer: &NodeAddress,
        delta: SubscriberDelta,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn deliver(
        &self,
        peer: &NodeAddress,
        topic: &str,
        message_type: &str,
        payload: Vec<u8>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
