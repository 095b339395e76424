//! Shared value types for topic scope and subscriber-set replication.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::{ActorAddress, NodeAddress};

/// A topic's lifetime binding: an optional owner ref, plus a scope of
/// either system-lifetime or actor-lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicScope {
    /// Lives for the lifetime of the actor system; has no owner to watch.
    SystemLifetime,
    /// Torn down when its owner actor stops.
    ActorLifetime,
}

/// A compact subscriber-set change, gossiped from the node where it
/// happened to every peer topic actor for the same `(name, message type)`.
///
/// `now_empty` tells the receiving node whether `node` still has any local
/// subscribers after this delta, so remote fan-out can stop deputizing a
/// node once its last local subscriber leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberDelta {
    pub topic: String,
    pub message_type: String,
    pub node: NodeAddress,
    pub added: Vec<ActorAddress>,
    pub removed: Vec<ActorAddress>,
    pub now_empty: bool,
    /// Set when the sending node's topic owner terminated; peers that see
    /// this tear their own local view of the topic down too.
    pub owner_terminated: bool,
}

impl SubscriberDelta {
    pub fn owner_terminated(topic: impl Into<String>, message_type: impl Into<String>, node: NodeAddress) -> Self {
        Self {
            topic: topic.into(),
            message_type: message_type.into(),
            node,
            added: Vec::new(),
            removed: Vec::new(),
            now_empty: true,
            owner_terminated: true,
        }
    }
}
