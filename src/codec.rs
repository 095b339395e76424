//! The `Codec` capability: serialize/deserialize over a registered
//! type-tag set. The kernel never reflects on payloads — it only demands
//! this capability from whatever transport or persistence layer needs
//! bytes on the wire.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors raised by a [`Codec`] implementation.
///
/// An unknown tag on receive is an error, not a crash — the caller is
/// expected to turn it into a typed dead-letter event rather than panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No codec registration exists for this type tag.
    #[error("no codec registered for tag '{0}'")]
    UnknownTag(String),

    /// The payload did not decode into the requested type.
    #[error("failed to decode tag '{tag}': {reason}")]
    Decode {
        /// The tag the payload claimed to be.
        tag: String,
        /// A human-readable decode failure reason.
        reason: String,
    },

    /// The value failed to encode.
    #[error("failed to encode tag '{tag}': {reason}")]
    Encode {
        /// The tag being encoded.
        tag: String,
        /// A human-readable encode failure reason.
        reason: String,
    },
}

impl CodecError {
    /// Encode/decode failures under a registered tag are not retryable;
    /// an unknown tag may become known after a later registration.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownTag(_))
    }
}

/// A registered byte codec for a fixed set of type tags.
///
/// Type registration is a startup-time concern; the default [`JsonCodec`]
/// has no registration step because `serde_json` decodes structurally
/// rather than by a closed type registry, but the trait shape supports
/// codecs (e.g. a schema-registry-backed one) that do reject unregistered
/// tags up front.
pub trait Codec: Send + Sync + fmt::Debug + 'static {
    /// Serialize `value` tagged as `tag`.
    fn encode<T: Serialize>(&self, tag: &str, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialize `bytes` tagged as `tag` into `T`.
    fn decode<T: DeserializeOwned>(&self, tag: &str, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Default codec: JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, tag: &str, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|err| CodecError::Encode {
            tag: tag.to_string(),
            reason: err.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, tag: &str, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::Decode {
            tag: tag.to_string(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec;
        let original = Sample { value: 7 };
        let bytes = codec.encode("sample", &original).unwrap();
        let decoded: Sample = codec.decode("sample", &bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn json_codec_decode_failure_is_fatal() {
        let codec = JsonCodec;
        let err = codec.decode::<Sample>("sample", b"not json").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn unknown_tag_is_not_fatal() {
        let err = CodecError::UnknownTag("mystery".to_string());
        assert!(!err.is_fatal());
    }
}
