//! The membership table: local view of cluster state, updated by gossip
//! merges and local status transitions.

// Layer 1: Standard library imports
use std::collections::BTreeSet;

// Layer 2: Third-party crate imports
use chrono::Utc;
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::error::ClusterError;
use super::types::{ClusterMember, MemberRole, MemberStatus, MembershipSnapshot};
use crate::util::NodeAddress;

/// Lock-free, concurrently-updatable view of the cluster's membership table.
///
/// Every node runs one `Membership` instance seeded with its own address.
/// Gossip rounds merge remote snapshots into it via [`Membership::merge`];
/// the merge rule is last-writer-wins by `incarnation`, matching
/// `RestartBackoff`'s "local counter, no external clock" convention
/// applied to conflict resolution instead of backoff timing.
pub struct Membership {
    local: NodeAddress,
    members: DashMap<NodeAddress, ClusterMember>,
    epoch: std::sync::atomic::AtomicU64,
}

impl Membership {
    /// Seed a membership table with the local node, already `Up`.
    pub fn new(local: NodeAddress, roles: BTreeSet<MemberRole>) -> Self {
        let mut member = ClusterMember::new(local.clone(), roles);
        member.status = MemberStatus::Up;

        let members = DashMap::new();
        members.insert(local.clone(), member);

        Self {
            local,
            members,
            epoch: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn local_address(&self) -> &NodeAddress {
        &self.local
    }

    /// Record a newly-joining peer with `Joining` status.
    pub fn note_joining(&self, address: NodeAddress, roles: BTreeSet<MemberRole>) {
        self.members
            .entry(address.clone())
            .or_insert_with(|| ClusterMember::new(address, roles));
        self.bump_epoch();
    }

    /// Transition a known member to a new status, bumping its incarnation.
    pub fn set_status(&self, address: &NodeAddress, status: MemberStatus) -> Result<(), ClusterError> {
        let mut entry = self
            .members
            .get_mut(address)
            .ok_or_else(|| ClusterError::UnknownMember {
                node: address.clone(),
            })?;
        entry.status = status;
        entry.incarnation += 1;
        drop(entry);
        self.bump_epoch();
        Ok(())
    }

    /// Merge a remote snapshot into the local table. For each remote row,
    /// the entry with the higher `incarnation` wins; rows absent locally are
    /// inserted outright.
    pub fn merge(&self, remote: &MembershipSnapshot) {
        for incoming in &remote.members {
            match self.members.get(&incoming.address) {
                Some(existing) if existing.incarnation >= incoming.incarnation => continue,
                _ => {
                    self.members.insert(incoming.address.clone(), incoming.clone());
                }
            }
        }
        self.bump_epoch();
    }

    /// A point-in-time snapshot suitable for gossip exchange or placement
    /// decisions.
    pub fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            epoch: self.epoch.load(std::sync::atomic::Ordering::Acquire),
            members: self.members.iter().map(|e| e.value().clone()).collect(),
            generated_at: Utc::now(),
        }
    }

    /// Members currently reachable and eligible for placement, optionally
    /// filtered by role.
    pub fn members_with_role(&self, role: Option<&str>) -> Vec<NodeAddress> {
        self.members
            .iter()
            .filter(|e| e.status == MemberStatus::Up)
            .filter(|e| role.map(|r| e.has_role(r)).unwrap_or(true))
            .map(|e| e.address.clone())
            .collect()
    }

    pub fn member(&self, address: &NodeAddress) -> Option<ClusterMember> {
        self.members.get(address).map(|e| e.value().clone())
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
    }
}
