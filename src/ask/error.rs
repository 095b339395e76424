//! Error type for the fluent ask builder.

// Layer 1: Standard library imports
use std::error::Error;
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors surfaced by [`super::builder::AskBuilder::execute`].
#[derive(Debug, Error)]
pub enum AskError {
    /// The ask's own deadline elapsed before a reply arrived.
    #[error("ask timed out after {deadline:?}")]
    Timeout { deadline: Duration },

    /// The target replied by closing its reply channel instead of sending
    /// a value (e.g. it stopped mid-handling).
    #[error("ask target closed without replying")]
    NoReply,

    /// The underlying broker call failed (routing, mailbox closed, etc.)
    /// before a timeout could even be considered.
    #[error("ask failed: {source}")]
    Broker {
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl AskError {
    /// `true` if the ask may succeed on a fresh attempt (timeout, or a
    /// target that closed without replying).
    pub fn is_retryable(&self) -> bool {
        matches!(self, AskError::Timeout { .. } | AskError::NoReply)
    }

    /// `true` if this error reflects a real deadline expiry rather than a
    /// broker-level failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AskError::Timeout { .. })
    }
}
