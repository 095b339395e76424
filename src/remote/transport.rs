//! Node-to-node framed transport over TCP, gated by an optional trusted-peer
//! allowlist.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, error, info};

// Layer 3: Internal module imports
use super::connection::{Connection, ConnectionPool, SharedConnectionPool};
use super::error::TransportError;
use super::frame::Frame;
use super::security::PeerAllowlist;
use crate::util::NodeAddress;

/// Sends frames to peers and yields frames received from peers.
///
/// Kept as a trait (rather than a single concrete `TcpTransport`) so tests
/// and single-process deployments can substitute an in-memory transport
/// without touching the sharding/pub-sub code that depends on it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver a frame to `peer`, opening a connection if none is pooled yet.
    async fn send(&self, peer: &NodeAddress, frame: Frame) -> Result<(), TransportError>;
}

/// A length-delimited, JSON-framed TCP transport, gated by an optional
/// trusted-peer allowlist checked before each outbound connect.
pub struct TcpTransport {
    local: NodeAddress,
    pool: SharedConnectionPool,
    allowlist: Option<PeerAllowlist>,
    inbound: mpsc::Sender<Frame>,
}

impl TcpTransport {
    /// Bind a listener on `local` and spawn the accept loop. Frames received
    /// from any peer are forwarded onto `inbound` for the caller (typically
    /// the actor system's router) to dispatch locally.
    pub async fn bind(
        local: NodeAddress,
        allowlist: Option<PeerAllowlist>,
        inbound: mpsc::Sender<Frame>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(local.as_str())
            .await
            .map_err(|source| TransportError::ConnectFailed {
                peer: local.clone(),
                source,
            })?;

        let transport = Self {
            local: local.clone(),
            pool: Arc::new(ConnectionPool::new()),
            allowlist,
            inbound,
        };

        let inbound_for_accept = transport.inbound.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer_addr)) => {
                        info!(%peer_addr, "accepted inbound connection");
                        let inbound = inbound_for_accept.clone();
                        tokio::spawn(Self::read_loop(stream, inbound));
                    }
                    Err(error) => {
                        error!(%error, "accept failed");
                        break;
                    }
                }
            }
        });

        Ok(transport)
    }

    async fn read_loop(stream: TcpStream, inbound: mpsc::Sender<Frame>) {
        let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
        while let Some(chunk) = framed.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(error) => {
                    error!(%error, "frame read failed");
                    break;
                }
            };
            match serde_json::from_slice::<Frame>(&bytes) {
                Ok(frame) => {
                    if inbound.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(error) => error!(%error, "frame decode failed"),
            }
        }
        debug!("inbound connection closed");
    }

    async fn connect(&self, peer: &NodeAddress) -> Result<Connection, TransportError> {
        if let Some(existing) = self.pool.get(peer) {
            return Ok(existing);
        }

        let stream = TcpStream::connect(peer.as_str())
            .await
            .map_err(|source| TransportError::ConnectFailed {
                peer: peer.clone(),
                source,
            })?;

        if let Some(allowlist) = &self.allowlist {
            allowlist.verify_peer(peer)?;
        }

        let (connection, mut outbound_rx) = Connection::channel(peer.clone(), Connection::DEFAULT_QUEUE_CAPACITY);
        self.pool.insert(connection.clone());

        tokio::spawn(async move {
            let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
            while let Some(frame) = outbound_rx.recv().await {
                let Ok(encoded) = serde_json::to_vec(&frame) else {
                    continue;
                };
                if framed.send(encoded.into()).await.is_err() {
                    break;
                }
            }
        });

        Ok(connection)
    }

    pub fn local_address(&self) -> &NodeAddress {
        &self.local
    }

    pub fn connection_count(&self) -> usize {
        self.pool.len()
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&self, peer: &NodeAddress, frame: Frame) -> Result<(), TransportError> {
        let connection = self.connect(peer).await?;
        connection.send(frame).await
    }
}
