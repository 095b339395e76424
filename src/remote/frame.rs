//! The wire frame exchanged between nodes.
//!
//! A frame carries an already-encoded message payload (produced by the
//! sender's [`crate::codec::Codec`]) plus the addressing metadata the
//! receiving node needs to route it to a local actor without having to
//! deserialize the payload first.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::{ActorPath, MessageId};

/// A routed, codec-tagged message crossing the wire between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Path of the actor this frame is destined for on the receiving node.
    pub destination_path: ActorPath,
    /// Name of the codec the payload was encoded with (e.g. `"json"`),
    /// so the receiver can pick the matching decoder.
    pub codec_tag: String,
    /// The already-encoded message body.
    pub payload: Vec<u8>,
    /// Present on request/ask frames; echoed back on the reply frame so the
    /// sender can match it to its pending oneshot.
    pub correlation_id: Option<MessageId>,
    /// Path of the sending actor, for replies and tracing.
    pub sender_path: Option<ActorPath>,
}

impl Frame {
    pub fn new(destination_path: ActorPath, codec_tag: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            destination_path,
            codec_tag: codec_tag.into(),
            payload,
            correlation_id: None,
            sender_path: None,
        }
    }

    pub fn with_correlation_id(mut self, id: MessageId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn with_sender_path(mut self, path: ActorPath) -> Self {
        self.sender_path = Some(path);
        self
    }
}
