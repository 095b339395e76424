//! Distributed pub/sub: topics identified by `(name, message type)`, a
//! local subscriber set per node replicated by gossip-style deltas, and
//! at-most-once fan-out to local subscribers plus one deputy per remote
//! node.
//!
//! # Module Organization (§4.3)
//!
//! - `types.rs` - `TopicScope`, `SubscriberDelta`
//! - `gossip.rs` - `TopicTransport`: delta replication and remote fan-out
//! - `topic.rs` - `Topic<M, B, T>`: one node's view of one topic
//! - `registry.rs` - `TopicRegistry<M, B, T>`: lazy per-message-type topic table
//! - `subscriber.rs` - `Subscription`: RAII auto-unsubscribe guard
//! - `error.rs` - `TopicError`

pub mod error;
pub mod gossip;
pub mod registry;
pub mod subscriber;
pub mod topic;
pub mod types;

pub use error::TopicError;
pub use gossip::TopicTransport;
pub use registry::TopicRegistry;
pub use subscriber::Subscription;
pub use topic::Topic;
pub use types::{SubscriberDelta, TopicScope};
