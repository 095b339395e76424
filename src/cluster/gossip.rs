//! Gossip round scheduling: periodically pick random peers and exchange
//! membership snapshots with them.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use rand::seq::SliceRandom;
use tokio::time::interval;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::membership::Membership;
use super::types::MembershipSnapshot;
use crate::util::NodeAddress;

/// Sends a locally-generated membership snapshot to one peer and returns the
/// peer's own snapshot. The transport module supplies the concrete
/// implementation (framed request over the node-to-node connection); tests
/// use an in-memory stand-in.
#[async_trait::async_trait]
pub trait GossipTransport: Send + Sync + 'static {
    async fn exchange(
        &self,
        peer: &NodeAddress,
        local: MembershipSnapshot,
    ) -> Result<MembershipSnapshot, Box<dyn std::error::Error + Send + Sync>>;
}

/// Drives periodic gossip rounds against a random subset of known peers.
///
/// Rather than a fixed fanout, each round picks `fanout` peers at random
/// so that information converges in O(log n) rounds regardless of
/// cluster size.
pub struct GossipScheduler<T: GossipTransport> {
    membership: Arc<Membership>,
    transport: T,
    round_interval: Duration,
    fanout: usize,
}

impl<T: GossipTransport> GossipScheduler<T> {
    pub fn new(membership: Arc<Membership>, transport: T, round_interval: Duration, fanout: usize) -> Self {
        Self {
            membership,
            transport,
            round_interval,
            fanout: fanout.max(1),
        }
    }

    /// Run gossip rounds until cancelled. Intended to be spawned as a
    /// long-lived background task alongside the actor system's own runtime.
    pub async fn run(&self) {
        let mut ticker = interval(self.round_interval);
        loop {
            ticker.tick().await;
            self.gossip_round().await;
        }
    }

    /// Exchange snapshots with up to `fanout` random peers, merging each
    /// response into the local membership table.
    pub async fn gossip_round(&self) {
        let local = self.membership.local_address().clone();
        let mut peers: Vec<NodeAddress> = self
            .membership
            .members_with_role(None)
            .into_iter()
            .filter(|p| p != &local)
            .collect();

        peers.shuffle(&mut rand::thread_rng());
        peers.truncate(self.fanout);

        for peer in peers {
            let snapshot = self.membership.snapshot();
            match self.transport.exchange(&peer, snapshot).await {
                Ok(remote) => {
                    self.membership.merge(&remote);
                    debug!(%peer, "gossip exchange succeeded");
                }
                Err(error) => {
                    warn!(%peer, %error, "gossip exchange failed");
                }
            }
        }
    }
}
