//! Integration tests for cluster membership: gossip merge, failure
//! detection, leader election, and split-brain resolution working together
//! over a small simulated cluster view.

#![allow(clippy::unwrap_used)]

use meshcell::cluster::{
    elect_leader, is_leader, ClusterMember, FailureDetector, MemberStatus, Membership,
    MembershipSnapshot, SplitBrainStrategy,
};
use meshcell::util::NodeAddress;
use std::collections::BTreeSet;
use std::time::Duration;

fn up_member(node: &str, joined_offset_secs: i64) -> ClusterMember {
    let mut member = ClusterMember::new(NodeAddress::new(node), BTreeSet::new());
    member.status = MemberStatus::Up;
    member.joined_at = chrono::Utc::now() + chrono::Duration::seconds(joined_offset_secs);
    member
}

#[test]
fn gossip_merge_picks_up_a_remote_members_join() {
    let local = Membership::new(NodeAddress::new("n1:9001"), BTreeSet::new());

    let remote_member = up_member("n2:9001", 0);
    let remote_snapshot = MembershipSnapshot {
        epoch: 1,
        members: vec![remote_member],
        generated_at: chrono::Utc::now(),
    };

    local.merge(&remote_snapshot);

    let member = local.member(&NodeAddress::new("n2:9001")).unwrap();
    assert_eq!(member.status, MemberStatus::Up);
}

#[test]
fn merge_ignores_a_stale_incarnation() {
    let local = Membership::new(NodeAddress::new("n1:9001"), BTreeSet::new());
    local.note_joining(NodeAddress::new("n2:9001"), BTreeSet::new());
    local
        .set_status(&NodeAddress::new("n2:9001"), MemberStatus::Up)
        .unwrap();

    // A stale snapshot claiming n2 is still Joining at incarnation 0 must
    // not roll the locally-advanced member backwards.
    let mut stale = ClusterMember::new(NodeAddress::new("n2:9001"), BTreeSet::new());
    stale.incarnation = 0;
    local.merge(&MembershipSnapshot {
        epoch: 0,
        members: vec![stale],
        generated_at: chrono::Utc::now(),
    });

    let member = local.member(&NodeAddress::new("n2:9001")).unwrap();
    assert_eq!(member.status, MemberStatus::Up);
}

#[test]
fn failure_detector_suspects_after_enough_missed_heartbeats() {
    let mut detector = FailureDetector::new(Duration::from_secs(10), 3);
    detector.record_heartbeat();
    assert!(!detector.is_suspected());

    detector.record_miss();
    detector.record_miss();
    assert!(!detector.is_suspected());

    detector.record_miss();
    assert!(detector.is_suspected());
}

#[test]
fn leader_election_is_deterministic_across_two_snapshots_of_the_same_members() {
    // Same three members, each with a fixed join time, listed in a
    // different order in the two snapshots — election must not depend on
    // list order.
    let n1 = up_member("n1:9001", -100);
    let n2 = up_member("n2:9001", -50);
    let n3 = up_member("n3:9001", 0);

    let snapshot = MembershipSnapshot {
        epoch: 1,
        members: vec![n2.clone(), n1.clone(), n3.clone()],
        generated_at: chrono::Utc::now(),
    };
    let reordered = MembershipSnapshot {
        epoch: 1,
        members: vec![n3, n1, n2],
        generated_at: chrono::Utc::now(),
    };

    let leader_a = elect_leader(&snapshot).unwrap();
    let leader_b = elect_leader(&reordered).unwrap();
    assert_eq!(leader_a, leader_b);
    assert_eq!(leader_a, NodeAddress::new("n1:9001"));
    assert!(is_leader(&snapshot, &leader_a));
}

#[test]
fn split_brain_keep_majority_downs_the_minority_side() {
    let snapshot = MembershipSnapshot {
        epoch: 1,
        members: vec![up_member("n1:9001", 0), up_member("n2:9001", 0), up_member("n3:9001", 0)],
        generated_at: chrono::Utc::now(),
    };

    // n1 is on the majority side (itself + n2 reachable, n3 unreachable).
    let outcome = SplitBrainStrategy::KeepMajority.resolve(
        &NodeAddress::new("n1:9001"),
        &snapshot,
        &[NodeAddress::new("n3:9001")],
    );
    assert!(!outcome.self_downed);
    assert_eq!(outcome.downed, vec![NodeAddress::new("n3:9001")]);
}

#[test]
fn split_brain_keep_majority_downs_itself_on_the_minority_side() {
    let snapshot = MembershipSnapshot {
        epoch: 1,
        members: vec![up_member("n1:9001", 0), up_member("n2:9001", 0), up_member("n3:9001", 0)],
        generated_at: chrono::Utc::now(),
    };

    // n3 only sees itself; n1 and n2 are unreachable from here.
    let outcome = SplitBrainStrategy::KeepMajority.resolve(
        &NodeAddress::new("n3:9001"),
        &snapshot,
        &[NodeAddress::new("n1:9001"), NodeAddress::new("n2:9001")],
    );
    assert!(outcome.self_downed);
}
