//! Error types for topic subscription, publish, and replication.

// Layer 1: Standard library imports
use std::error::Error;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::NodeAddress;

/// Errors that can occur publishing to, or replicating, a topic.
#[derive(Debug, Error)]
pub enum TopicError {
    /// The topic's owner has terminated; the topic is torn down and the
    /// publish was silently a no-op rather than an error at the call site
    /// that originated it — this variant is for callers that need to know.
    #[error("topic {topic} has no owner and is no longer accepting publishes")]
    OwnerTerminated { topic: String },

    /// Delivering a message to a local subscriber's mailbox failed.
    #[error("delivery to subscriber {subscriber} on topic {topic} failed: {source}")]
    DeliveryFailed {
        topic: String,
        subscriber: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// Broadcasting a subscriber delta, or a remote fan-out deliver, to a
    /// peer node failed.
    #[error("replication to {peer} for topic {topic} failed: {reason}")]
    ReplicationFailed {
        topic: String,
        peer: NodeAddress,
        reason: String,
    },
}

impl TopicError {
    /// `true` if the topic itself is gone rather than a single delivery or
    /// replication attempt having failed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TopicError::OwnerTerminated { .. })
    }

    /// `true` if retrying the same operation may succeed (a single
    /// subscriber mailbox or peer was unreachable, not the topic itself).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TopicError::DeliveryFailed { .. } | TopicError::ReplicationFailed { .. }
        )
    }

    /// The topic name this error concerns.
    pub fn topic(&self) -> &str {
        match self {
            TopicError::OwnerTerminated { topic }
            | TopicError::DeliveryFailed { topic, .. }
            | TopicError::ReplicationFailed { topic, .. } => topic,
        }
    }
}
