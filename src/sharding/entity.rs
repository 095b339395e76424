//! Entity message routing and lazy activation.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::message::{Message, MessageEnvelope};

/// Derives the entity id a message envelope targets. Pluggable so
/// applications that embed the entity id in the payload instead of the
/// envelope header can supply their own extractor.
pub trait MessageExtractor<M: Message>: Send + Sync + 'static {
    fn extract_entity_id(envelope: &MessageEnvelope<M>) -> Option<String>;
}

/// Default extractor: reads the envelope's `entity_id` header.
pub struct DefaultExtractor;

impl<M: Message> MessageExtractor<M> for DefaultExtractor {
    fn extract_entity_id(envelope: &MessageEnvelope<M>) -> Option<String> {
        envelope.entity_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    #[test]
    fn default_extractor_reads_entity_id_header() {
        let envelope = MessageEnvelope::new(Ping).with_entity_id("w-42");
        assert_eq!(
            DefaultExtractor::extract_entity_id(&envelope),
            Some("w-42".to_string())
        );
    }

    #[test]
    fn default_extractor_none_when_header_absent() {
        let envelope = MessageEnvelope::new(Ping);
        assert_eq!(DefaultExtractor::extract_entity_id(&envelope), None);
    }
}
