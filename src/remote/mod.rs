//! Remote transport: framed, codec-tagged delivery between cluster nodes.
//!
//! # Module Organization (§4.3)
//!
//! - `transport.rs` - `Transport` trait + `TcpTransport`
//! - `frame.rs` - Wire `Frame` type
//! - `connection.rs` - Per-destination bounded outbound queue (backpressure)
//! - `security.rs` - Optional trusted-peer allowlist
//! - `error.rs` - `TransportError`

pub mod connection;
pub mod error;
pub mod frame;
pub mod security;
pub mod transport;

pub use connection::{Connection, ConnectionPool, SharedConnectionPool};
pub use error::TransportError;
pub use frame::Frame;
pub use security::PeerAllowlist;
pub use transport::{TcpTransport, Transport};
