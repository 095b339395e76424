//! Split-brain resolution strategies.
//!
//! When the gossip network partitions, each side sees the other half as
//! `Unreachable`. A `SplitBrainStrategy` decides which side survives (stays
//! `Up`) and which is downed, run independently on every node against its
//! own local view so all sides converge on the same decision without a
//! coordinator.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::types::{MemberStatus, MembershipSnapshot};
use crate::util::NodeAddress;

/// A decision from a split-brain resolution pass: which members should be
/// downed on this side of the partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub downed: Vec<NodeAddress>,
    pub self_downed: bool,
}

/// Strategies for deciding which side of a network partition survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitBrainStrategy {
    /// The side with more `Up` members wins; the minority downs itself.
    /// Ties down both sides to avoid a dual-primary outcome.
    KeepMajority,
    /// The side containing the member with the earliest `joined_at`
    /// timestamp wins.
    KeepOldest,
    /// A fixed quorum size is required to remain `Up`; below it, every
    /// member on this side downs itself regardless of relative size.
    StaticQuorum { quorum_size: usize },
}

impl SplitBrainStrategy {
    /// Decide the resolution outcome for `local`, given the full snapshot
    /// before the partition was detected and the set of members now
    /// considered unreachable from this side.
    pub fn resolve(
        &self,
        local: &NodeAddress,
        snapshot: &MembershipSnapshot,
        unreachable: &[NodeAddress],
    ) -> ResolutionOutcome {
        let reachable: Vec<_> = snapshot
            .members
            .iter()
            .filter(|m| m.status == MemberStatus::Up)
            .filter(|m| !unreachable.contains(&m.address))
            .collect();

        match self {
            SplitBrainStrategy::KeepMajority => {
                let total_voting = snapshot.voting_members().count();
                let this_side = reachable.len();
                let other_side = unreachable.len();

                if this_side > other_side && this_side * 2 > total_voting {
                    ResolutionOutcome {
                        downed: unreachable.to_vec(),
                        self_downed: false,
                    }
                } else if this_side == other_side {
                    // Exact tie: fall back to the oldest-member tie-break
                    // rather than downing both sides and losing the cluster.
                    Self::resolve_by_oldest(local, snapshot, unreachable, &reachable)
                } else {
                    let mut downed: Vec<_> = reachable.iter().map(|m| m.address.clone()).collect();
                    downed.retain(|a| a != local);
                    ResolutionOutcome {
                        downed,
                        self_downed: true,
                    }
                }
            }
            SplitBrainStrategy::KeepOldest => Self::resolve_by_oldest(local, snapshot, unreachable, &reachable),
            SplitBrainStrategy::StaticQuorum { quorum_size } => {
                if reachable.len() >= *quorum_size {
                    ResolutionOutcome {
                        downed: unreachable.to_vec(),
                        self_downed: false,
                    }
                } else {
                    let downed: Vec<_> = reachable
                        .iter()
                        .map(|m| m.address.clone())
                        .filter(|a| a != local)
                        .collect();
                    ResolutionOutcome {
                        downed,
                        self_downed: true,
                    }
                }
            }
        }
    }

    /// Keep the side holding the member with the earliest `joined_at`
    /// across the whole (pre-partition) snapshot; down the other side.
    fn resolve_by_oldest(
        local: &NodeAddress,
        snapshot: &MembershipSnapshot,
        unreachable: &[NodeAddress],
        reachable: &[&crate::cluster::types::ClusterMember],
    ) -> ResolutionOutcome {
        let oldest_overall = snapshot
            .voting_members()
            .min_by_key(|m| m.joined_at)
            .map(|m| m.address.clone());

        let this_side_has_oldest =
            oldest_overall.as_ref().is_some_and(|addr| reachable.iter().any(|m| &m.address == addr));

        if this_side_has_oldest {
            ResolutionOutcome {
                downed: unreachable.to_vec(),
                self_downed: false,
            }
        } else {
            let downed: Vec<_> = reachable
                .iter()
                .map(|m| m.address.clone())
                .filter(|a| a != local)
                .collect();
            ResolutionOutcome {
                downed,
                self_downed: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::types::ClusterMember;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::BTreeSet;

    fn member_at(addr: &str, joined_offset_secs: i64) -> ClusterMember {
        let mut m = ClusterMember::new(NodeAddress::new(addr), BTreeSet::new());
        m.status = MemberStatus::Up;
        m.joined_at = Utc::now() + ChronoDuration::seconds(joined_offset_secs);
        m
    }

    #[test]
    fn keep_majority_downs_minority_side() {
        let local = NodeAddress::new("n1:9001");
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![
                member_at("n1:9001", 0),
                member_at("n2:9001", 1),
                member_at("n3:9001", 2),
            ],
            generated_at: Utc::now(),
        };
        let unreachable = vec![NodeAddress::new("n2:9001"), NodeAddress::new("n3:9001")];

        let outcome = SplitBrainStrategy::KeepMajority.resolve(&local, &snapshot, &unreachable);
        assert!(outcome.self_downed);
        assert!(outcome.downed.is_empty());
    }

    #[test]
    fn keep_majority_breaks_an_exact_tie_by_oldest_member() {
        let local = NodeAddress::new("n1:9001");
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![member_at("n1:9001", -100), member_at("n2:9001", 0)],
            generated_at: Utc::now(),
        };
        let unreachable = vec![NodeAddress::new("n2:9001")];

        let outcome = SplitBrainStrategy::KeepMajority.resolve(&local, &snapshot, &unreachable);
        assert!(!outcome.self_downed);
        assert_eq!(outcome.downed, unreachable);
    }

    #[test]
    fn keep_majority_tie_downs_the_side_without_the_oldest_member() {
        let local = NodeAddress::new("n2:9001");
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![member_at("n1:9001", -100), member_at("n2:9001", 0)],
            generated_at: Utc::now(),
        };
        let unreachable = vec![NodeAddress::new("n1:9001")];

        let outcome = SplitBrainStrategy::KeepMajority.resolve(&local, &snapshot, &unreachable);
        assert!(outcome.self_downed);
    }

    #[test]
    fn keep_oldest_survives_on_side_with_earliest_member() {
        let local = NodeAddress::new("n1:9001");
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![member_at("n1:9001", -100), member_at("n2:9001", 0)],
            generated_at: Utc::now(),
        };
        let unreachable = vec![NodeAddress::new("n2:9001")];

        let outcome = SplitBrainStrategy::KeepOldest.resolve(&local, &snapshot, &unreachable);
        assert!(!outcome.self_downed);
        assert_eq!(outcome.downed, unreachable);
    }

    #[test]
    fn static_quorum_downs_self_below_threshold() {
        let local = NodeAddress::new("n1:9001");
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![member_at("n1:9001", 0), member_at("n2:9001", 1)],
            generated_at: Utc::now(),
        };
        let unreachable = vec![NodeAddress::new("n2:9001")];

        let outcome = SplitBrainStrategy::StaticQuorum { quorum_size: 2 }
            .resolve(&local, &snapshot, &unreachable);
        assert!(outcome.self_downed);
    }
}
