//! Consistent hashing from an entity id to a shard id.
//!
//! Grounded on `ActorRegistry::compute_routing_key` in `broker/registry.rs`:
//! the same `DefaultHasher` + modulo scheme, generalized from pool member
//! selection to a fixed shard space.

// Layer 1: Standard library imports
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::types::ShardId;

/// Map `entity_id` onto `[0, num_shards)`.
///
/// # Panics
///
/// Panics if `num_shards` is zero; a zero-shard space is a configuration
/// error the caller must not reach this function with.
pub fn shard_id_for(entity_id: &str, num_shards: u32) -> ShardId {
    assert!(num_shards > 0, "num_shards must be positive");
    let mut hasher = DefaultHasher::new();
    entity_id.hash(&mut hasher);
    (hasher.finish() % num_shards as u64) as ShardId
}
