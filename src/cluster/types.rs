//! Shared membership data types: member status, roles, and snapshots.

// Layer 1: Standard library imports
use std::collections::BTreeSet;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::NodeAddress;

/// A member's position in the cluster membership state machine.
///
/// ```text
/// Joining -> Up -> Leaving -> Exiting -> Removed
///             |
///             v
///       Unreachable -> Down -> Removed
/// ```
///
/// `Unreachable` is not a step forward in the lifecycle, it is a reachability
/// flag layered on top of `Up`: a member that was `Unreachable` and comes
/// back within the failure detector's window returns to `Up` rather than
/// continuing on to `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Announced itself to a seed node, not yet converged across the cluster.
    Joining,
    /// Fully joined and reachable; eligible for shard allocation and leadership.
    Up,
    /// Missed enough failure-detector heartbeats to be considered unreachable.
    Unreachable,
    /// Requested graceful removal (e.g. for a rolling deploy).
    Leaving,
    /// Handoff of owned shards/entities to other members is in progress.
    Exiting,
    /// Declared dead, either by the failure detector or split-brain resolution.
    Down,
    /// Fully removed from the membership table; will not reappear without rejoining.
    Removed,
}

impl MemberStatus {
    /// `true` for statuses that count towards quorum and leader election.
    pub fn is_voting(&self) -> bool {
        matches!(self, MemberStatus::Up | MemberStatus::Leaving)
    }

    /// `true` once a member has left the cluster for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MemberStatus::Down | MemberStatus::Removed)
    }
}

/// A role tag a member advertises at join time (e.g. `"shard-region"`,
/// `"seed"`). Sharding and singleton placement can be restricted to members
/// carrying a given role.
pub type MemberRole = String;

/// One row of the membership table: a node's address, status, and the
/// information needed for placement and leader election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub address: NodeAddress,
    pub status: MemberStatus,
    pub roles: BTreeSet<MemberRole>,
    /// Monotonically increasing per-node counter; every status change bumps
    /// it so gossip merges can tell the newer of two conflicting rows apart.
    pub incarnation: u64,
    pub joined_at: DateTime<Utc>,
}

impl ClusterMember {
    pub fn new(address: NodeAddress, roles: BTreeSet<MemberRole>) -> Self {
        Self {
            address,
            status: MemberStatus::Joining,
            roles,
            incarnation: 0,
            joined_at: Utc::now(),
        }
    }

    /// `true` if this member advertises `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// A point-in-time view of the full membership table, exchanged during
/// gossip rounds and consumed by leader election and shard placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub epoch: u64,
    pub members: Vec<ClusterMember>,
    pub generated_at: DateTime<Utc>,
}

impl MembershipSnapshot {
    pub fn empty() -> Self {
        Self {
            epoch: 0,
            members: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Members currently eligible for quorum/leadership (`Up` or `Leaving`).
    pub fn voting_members(&self) -> impl Iterator<Item = &ClusterMember> {
        self.members.iter().filter(|m| m.status.is_voting())
    }

    pub fn member(&self, address: &NodeAddress) -> Option<&ClusterMember> {
        self.members.iter().find(|m| &m.address == address)
    }
}
