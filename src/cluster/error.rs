//! Error types for cluster membership operations.

// Layer 1: Standard library imports
use std::error::Error;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::NodeAddress;

/// Errors that can occur during cluster membership, gossip, or leader
/// election operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Attempted to operate on a node not present in the membership table.
    #[error("unknown cluster member: {node}")]
    UnknownMember { node: NodeAddress },

    /// A join attempt was rejected by the seed node(s).
    #[error("join rejected by seed {seed}: {reason}")]
    JoinRejected { seed: NodeAddress, reason: String },

    /// Gossip exchange with a peer failed.
    #[error("gossip exchange with {peer} failed: {source}")]
    GossipFailed {
        peer: NodeAddress,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// No leader could be determined from the current membership snapshot.
    #[error("no leader elected: {reason}")]
    NoLeader { reason: String },

    /// A split-brain was detected and the configured resolution strategy
    /// could not produce a decision (e.g. a tied static quorum).
    #[error("split-brain resolution failed: {reason}")]
    SplitBrainUnresolved { reason: String },

    /// This node downed itself or another node as part of split-brain
    /// resolution and must not rejoin without an operator restart.
    #[error("node {node} was downed by split-brain resolution")]
    SelfDowned { node: NodeAddress },

    /// Invalid cluster configuration (e.g. empty seed list, zero quorum).
    #[error("invalid cluster configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

impl ClusterError {
    /// `true` if this node's membership in the cluster is no longer valid
    /// and the process should terminate rather than retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClusterError::SelfDowned { .. } | ClusterError::InvalidConfiguration { .. }
        )
    }

    /// `true` if the operation may succeed if retried (transient network or
    /// timing failure).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClusterError::GossipFailed { .. } | ClusterError::JoinRejected { .. }
        )
    }

    /// `true` if this error reflects a membership table miss rather than a
    /// protocol failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::UnknownMember { .. })
    }

    /// The node address this error is about, if any.
    pub fn node(&self) -> Option<&NodeAddress> {
        match self {
            ClusterError::UnknownMember { node } | ClusterError::SelfDowned { node } => Some(node),
            _ => None,
        }
    }
}
