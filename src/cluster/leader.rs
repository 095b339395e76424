//! Leader election: a deterministic function of the membership snapshot, so
//! every node computes the same leader without a separate election protocol.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::error::ClusterError;
use super::types::MembershipSnapshot;
use crate::util::NodeAddress;

/// Picks the leader as the next-oldest voting member by `joined_at`,
/// preferring deterministic ordering over coordinator round-trips (cf.
/// `ActorRegistry`'s hashing-based pool selection, which is likewise a pure
/// function of its inputs rather than a stateful vote).
///
/// The shard coordinator singleton and any other cluster-singleton actor
/// are hosted on whichever node this function names.
pub fn elect_leader(snapshot: &MembershipSnapshot) -> Result<NodeAddress, ClusterError> {
    snapshot
        .voting_members()
        .min_by_key(|m| m.joined_at)
        .map(|m| m.address.clone())
        .ok_or_else(|| ClusterError::NoLeader {
            reason: "no voting members in snapshot".to_string(),
        })
}

/// `true` if `candidate` is the leader of `snapshot`.
pub fn is_leader(snapshot: &MembershipSnapshot, candidate: &NodeAddress) -> bool {
    elect_leader(snapshot).as_ref() == Ok(candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cluster::types::{ClusterMember, MemberStatus};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::BTreeSet;

    fn up_member(addr: &str, joined_offset_secs: i64) -> ClusterMember {
        let mut m = ClusterMember::new(NodeAddress::new(addr), BTreeSet::new());
        m.status = MemberStatus::Up;
        m.joined_at = Utc::now() + ChronoDuration::seconds(joined_offset_secs);
        m
    }

    #[test]
    fn elects_oldest_member_by_join_time_regardless_of_address() {
        let snapshot = MembershipSnapshot {
            epoch: 1,
            members: vec![
                up_member("n3:9001", -100),
                up_member("n1:9001", 0),
                up_member("n2:9001", -50),
            ],
            generated_at: Utc::now(),
        };
        assert_eq!(elect_leader(&snapshot).unwrap(), NodeAddress::new("n3:9001"));
        assert!(is_leader(&snapshot, &NodeAddress::new("n3:9001")));
        assert!(!is_leader(&snapshot, &NodeAddress::new("n1:9001")));
    }

    #[test]
    fn no_voting_members_errors() {
        let snapshot = MembershipSnapshot::empty();
        let err = elect_leader(&snapshot).unwrap_err();
        assert!(matches!(err, ClusterError::NoLeader { .. }));
    }
}
