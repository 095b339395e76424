//! Cluster membership: gossip-based membership table, failure detection,
//! leader election, and split-brain resolution.
//!
//! # Module Organization (§4.3)
//!
//! This mod.rs file contains ONLY module declarations and re-exports.
//!
//! - `types.rs` - Member status, roles, membership snapshot
//! - `membership.rs` - The concurrently-updatable membership table
//! - `gossip.rs` - Periodic gossip round scheduling
//! - `failure_detector.rs` - Per-peer reachability tracking
//! - `split_brain.rs` - Partition resolution strategies
//! - `leader.rs` - Deterministic leader election
//! - `error.rs` - `ClusterError`
//!
//! # See Also
//!
//! - [`sharding`](crate::sharding) - Entity placement, which relies on
//!   membership snapshots for region assignment.
//! - [`pubsub`](crate::pubsub) - Topic subscriber replication over gossip.

pub mod error;
pub mod failure_detector;
pub mod gossip;
pub mod leader;
pub mod membership;
pub mod split_brain;
pub mod types;

pub use error::ClusterError;
pub use failure_detector::FailureDetector;
pub use gossip::{GossipScheduler, GossipTransport};
pub use leader::{elect_leader, is_leader};
pub use membership::Membership;
pub use split_brain::{ResolutionOutcome, SplitBrainStrategy};
pub use types::{ClusterMember, MemberRole, MemberStatus, MembershipSnapshot};
