//! Named worker-pool dispatcher: runs many actor cells across a fixed set
//! of tasks instead of giving each actor its own `tokio::spawn`ed loop.
//!
//! The direct-spawn path (`ActorSystem::spawn`) still spawns one task per
//! actor; this module is for workloads that want to bound the number of
//! OS-scheduled tasks independently of actor count, trading per-actor
//! latency for throughput and predictable scheduling under load.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

pub mod blocking;
pub mod pool;
pub mod worker;

pub use blocking::{BlockingDispatcher, BlockingSender};
pub use pool::{DispatchSender, Dispatcher, DispatcherConfig};

/// Errors from sending through a [`DispatchSender`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The actor's cell has already reached a terminal state.
    #[error("actor mailbox closed")]
    MailboxClosed,
}
