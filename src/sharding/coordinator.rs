//! Shard allocation table and rebalance/handoff protocol.
//!
//! The coordinator itself is a cluster singleton: only the node elected
//! leader by [`crate::cluster::leader::elect_leader`] runs one. On failover
//! the next-oldest member re-derives the same leader and the allocation
//! table is rebuilt from each region's `RequestAllocation` calls rather
//! than replicated directly, keeping the coordinator stateless across
//! restarts the way a supervisor tree rebuilds child state from a
//! `ChildSpec` rather than snapshotting live state.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::info;

// Layer 3: Internal module imports
use super::error::ShardingError;
use super::types::{ShardAllocation, ShardId, ShardStatus};
use crate::cluster::Membership;
use crate::util::NodeAddress;

/// Tracks which node owns each shard and drives rebalance/handoff.
pub struct ShardCoordinator {
    allocations: DashMap<ShardId, ShardAllocation>,
    num_shards: u32,
    role: Option<String>,
}

impl ShardCoordinator {
    pub fn new(num_shards: u32, role: Option<String>) -> Self {
        Self {
            allocations: DashMap::new(),
            num_shards,
            role,
        }
    }

    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    pub fn allocation(&self, shard_id: ShardId) -> Option<ShardAllocation> {
        self.allocations.get(&shard_id).map(|e| e.value().clone())
    }

    /// Handle a region's `RequestAllocation(shard_id)`: return the existing
    /// owner, or pick the least-loaded eligible member and record it.
    pub fn request_allocation(
        &self,
        shard_id: ShardId,
        membership: &Membership,
    ) -> Result<NodeAddress, ShardingError> {
        if let Some(existing) = self.allocation(shard_id) {
            if existing.status != ShardStatus::HandingOff {
                return Ok(existing.owner);
            }
        }

        let candidates = membership.members_with_role(self.role.as_deref());
        let owner = self.least_loaded(&candidates).ok_or(ShardingError::NoEligibleNode { shard_id })?;

        let mut allocation = ShardAllocation::new(shard_id, owner.clone());
        allocation.status = ShardStatus::Owned;
        self.allocations.insert(shard_id, allocation);
        info!(shard_id, %owner, "shard allocated");

        Ok(owner)
    }

    /// Begin moving `shard_id` from its current owner to `to`.
    pub fn begin_handoff(&self, shard_id: ShardId, to: NodeAddress) -> Result<(), ShardingError> {
        let mut entry = self
            .allocations
            .get_mut(&shard_id)
            .ok_or(ShardingError::NoEligibleNode { shard_id })?;
        entry.status = ShardStatus::HandingOff;
        info!(shard_id, from = %entry.owner, %to, "shard handoff started");
        Ok(())
    }

    /// Complete a handoff, transferring ownership to `to`.
    pub fn complete_handoff(&self, shard_id: ShardId, to: NodeAddress) {
        self.allocations.insert(
            shard_id,
            ShardAllocation {
                shard_id,
                owner: to,
                status: ShardStatus::Owned,
                allocated_at: chrono::Utc::now(),
            },
        );
    }

    /// The member from `candidates` currently owning the fewest shards.
    fn least_loaded(&self, candidates: &[NodeAddress]) -> Option<NodeAddress> {
        candidates
            .iter()
            .min_by_key(|candidate| {
                self.allocations
                    .iter()
                    .filter(|a| &a.owner == *candidate)
                    .count()
            })
            .cloned()
    }
}
