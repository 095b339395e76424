//! Error types for remote transport operations.

// Layer 1: Standard library imports
use std::error::Error;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::NodeAddress;

/// Errors that can occur while establishing or using a node-to-node
/// connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect to the destination failed.
    #[error("failed to connect to {peer}: {source}")]
    ConnectFailed {
        peer: NodeAddress,
        #[source]
        source: std::io::Error,
    },

    /// The TLS handshake did not complete.
    #[error("TLS handshake with {peer} failed: {reason}")]
    HandshakeFailed { peer: NodeAddress, reason: String },

    /// A frame could not be encoded or decoded.
    #[error("frame codec error: {reason}")]
    FrameCodec { reason: String },

    /// Delivery to the destination's outbound queue failed (connection
    /// dropped or per-destination backpressure queue closed).
    #[error("delivery to {peer} failed: {reason}")]
    DeliveryFailed { peer: NodeAddress, reason: String },

    /// The outbound queue for this destination is full and the caller's
    /// backpressure policy is to reject rather than wait.
    #[error("backpressure: outbound queue to {peer} is full")]
    Backpressure { peer: NodeAddress },

    /// Underlying I/O error not covered by a more specific variant.
    #[error("transport I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// `true` if retrying against the same peer is pointless without
    /// operator intervention (e.g. a rejected handshake).
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::HandshakeFailed { .. })
    }

    /// `true` if the failure is transient and a retry (possibly after a
    /// reconnect) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectFailed { .. }
                | TransportError::DeliveryFailed { .. }
                | TransportError::Io { .. }
        )
    }

    /// `true` if this error is a backpressure signal rather than a failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Backpressure { .. })
    }

    pub fn peer(&self) -> Option<&NodeAddress> {
        match self {
            TransportError::ConnectFailed { peer, .. }
            | TransportError::HandshakeFailed { peer, .. }
            | TransportError::DeliveryFailed { peer, .. }
            | TransportError::Backpressure { peer } => Some(peer),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(source: std::io::Error) -> Self {
        TransportError::Io { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_failure_is_fatal() {
        let err = TransportError::HandshakeFailed {
            peer: NodeAddress::new("n1:9001"),
            reason: "cert rejected".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn backpressure_is_transient_not_fatal() {
        let err = TransportError::Backpressure {
            peer: NodeAddress::new("n1:9001"),
        };
        assert!(err.is_transient());
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn io_error_converts_and_is_retryable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: TransportError = io_err.into();
        assert!(err.is_retryable());
        assert!(err.source().is_some());
    }
}
