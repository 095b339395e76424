//! Per-destination outbound queue: the transport's backpressure boundary.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::mpsc;
use tracing::warn;

// Layer 3: Internal module imports
use super::error::TransportError;
use super::frame::Frame;
use crate::util::NodeAddress;

/// Handle for enqueueing frames bound for one peer. Cloning is cheap; every
/// sender to the same peer shares the same bounded channel, so a slow or
/// dead peer applies backpressure uniformly across callers instead of
/// letting one caller starve the others.
#[derive(Clone)]
pub struct Connection {
    peer: NodeAddress,
    outbound: mpsc::Sender<Frame>,
}

impl Connection {
    /// Capacity of the outbound queue before [`Connection::send`] reports
    /// backpressure.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

    /// Build a connection paired with the receiving half the transport's
    /// write loop drains.
    pub fn channel(peer: NodeAddress, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { peer, outbound: tx }, rx)
    }

    pub fn peer(&self) -> &NodeAddress {
        &self.peer
    }

    /// Enqueue a frame without waiting if the queue is full.
    pub fn try_send(&self, frame: Frame) -> Result<(), TransportError> {
        self.outbound.try_send(frame).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => TransportError::Backpressure {
                peer: self.peer.clone(),
            },
            mpsc::error::TrySendError::Closed(_) => TransportError::DeliveryFailed {
                peer: self.peer.clone(),
                reason: "outbound queue closed".to_string(),
            },
        })
    }

    /// Enqueue a frame, waiting for room if the queue is full.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.outbound.send(frame).await.map_err(|_| TransportError::DeliveryFailed {
            peer: self.peer.clone(),
            reason: "outbound queue closed".to_string(),
        })
    }
}

/// Registry of live outbound connections, keyed by peer address.
pub struct ConnectionPool {
    connections: dashmap::DashMap<NodeAddress, Connection>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            connections: dashmap::DashMap::new(),
        }
    }

    pub fn insert(&self, connection: Connection) {
        self.connections.insert(connection.peer().clone(), connection);
    }

    pub fn get(&self, peer: &NodeAddress) -> Option<Connection> {
        self.connections.get(peer).map(|c| c.value().clone())
    }

    pub fn remove(&self, peer: &NodeAddress) {
        if self.connections.remove(peer).is_none() {
            warn!(%peer, "removed connection that was not tracked");
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedConnectionPool = Arc<ConnectionPool>;
