//! Error types for shard allocation and entity routing.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use super::types::ShardId;
use crate::util::NodeAddress;

/// Errors that can occur while allocating shards or routing to entities.
#[derive(Debug, Error)]
pub enum ShardingError {
    /// No eligible node (matching role, reachable, `Up`) was available for
    /// allocation.
    #[error("no eligible node for shard {shard_id}")]
    NoEligibleNode { shard_id: ShardId },

    /// The shard is mid-handoff and cannot accept new entity creation.
    #[error("shard {shard_id} is handing off from {from} to {to}")]
    HandoffInProgress {
        shard_id: ShardId,
        from: NodeAddress,
        to: NodeAddress,
    },

    /// The entity factory failed to construct a new entity instance.
    #[error("failed to activate entity '{entity_id}': {reason}")]
    ActivationFailed { entity_id: String, reason: String },

    /// The envelope carried no routable entity id and no extractor could
    /// derive one.
    #[error("message carries no entity id")]
    MissingEntityId,

    /// Delivery to the entity's mailbox failed (entity mailbox closed).
    #[error("delivery to entity '{entity_id}' failed")]
    DeliveryFailed { entity_id: String },

    /// The shard's owner could not be resolved (no eligible node in the
    /// allocation table) or is owned by a peer this region has no
    /// transport wired to reach.
    #[error("shard {shard_id} has no resolvable owner")]
    ShardUnavailable { shard_id: ShardId },

    /// Forwarding to the shard's remote owner failed at the transport
    /// layer.
    #[error("forwarding to remote owner of entity '{entity_id}' failed: {reason}")]
    RemoteForwardFailed { entity_id: String, reason: String },
}

impl ShardingError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShardingError::HandoffInProgress { .. }
                | ShardingError::NoEligibleNode { .. }
                | ShardingError::ShardUnavailable { .. }
                | ShardingError::RemoteForwardFailed { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShardingError::MissingEntityId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_in_progress_is_retryable() {
        let err = ShardingError::HandoffInProgress {
            shard_id: 3,
            from: NodeAddress::new("n1:9001"),
            to: NodeAddress::new("n2:9001"),
        };
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn missing_entity_id_is_not_found() {
        assert!(ShardingError::MissingEntityId.is_not_found());
    }

    #[test]
    fn shard_unavailable_is_retryable() {
        assert!(ShardingError::ShardUnavailable { shard_id: 4 }.is_retryable());
    }

    #[test]
    fn remote_forward_failed_is_retryable() {
        let err = ShardingError::RemoteForwardFailed {
            entity_id: "w-1".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }
}
