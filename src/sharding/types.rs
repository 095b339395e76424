//! Shared sharding data types: shard ids, allocation, and status.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::NodeAddress;

/// A shard's index within the fixed-size shard space configured for an
/// entity type.
pub type ShardId = u32;

/// The status of one shard's allocation, tracked by the coordinator and
/// mirrored into [`crate::monitoring::ShardEvent`] as it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardStatus {
    /// The coordinator has picked a node but the region has not yet
    /// confirmed ownership.
    Allocating,
    /// Owned outright by the node recorded in the allocation table.
    Owned,
    /// Entities are being handed off to a new owner; the owning region
    /// rejects new entity activation until handoff completes.
    HandingOff,
    /// Not owned locally; messages for this shard forward to its owner.
    Remote,
}

/// One row of the shard coordinator's allocation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardAllocation {
    pub shard_id: ShardId,
    pub owner: NodeAddress,
    pub status: ShardStatus,
    pub allocated_at: DateTime<Utc>,
}

impl ShardAllocation {
    pub fn new(shard_id: ShardId, owner: NodeAddress) -> Self {
        Self {
            shard_id,
            owner,
            status: ShardStatus::Allocating,
            allocated_at: Utc::now(),
        }
    }
}
