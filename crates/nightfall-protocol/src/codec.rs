//! Codec trait and the JSON implementation.
//!
//! The server never serializes envelopes directly; it asks a [`Codec`].
//! Swapping the wire format means adding another implementation, nothing
//! else changes.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec is shared by every connection
/// task the server spawns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use nightfall_protocol::{Codec, Envelope, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::new(
///     1,
///     0,
///     Request::AdvancePhase {
///         lobby_code: Some("abcd".into()),
///         host_id: Some("host".into()),
///     },
/// );
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope<Request> = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, ErrorKind, Response};

    #[test]
    fn test_json_codec_decodes_text_frame_bytes() {
        let raw = br#"{"seq":3,"timestamp":10,"payload":{"type":"StartGame","lobby_code":"wolf","host_id":"h1"}}"#;
        let envelope: Envelope<crate::Request> = JsonCodec.decode(raw).unwrap();
        assert_eq!(envelope.seq, 3);
        assert!(matches!(
            envelope.payload,
            crate::Request::StartGame { lobby_code: Some(ref c), .. } if c == "wolf"
        ));
    }

    #[test]
    fn test_json_codec_garbage_is_decode_error() {
        let result: Result<Envelope<Response>, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encodes_error_response() {
        let envelope = Envelope::new(
            7,
            0,
            Response::error(ErrorKind::NotFound, "Lobby not found"),
        );
        let bytes = JsonCodec.encode(&envelope).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["payload"]["type"], "Error");
        assert_eq!(json["payload"]["kind"], "NotFound");
        assert_eq!(json["payload"]["code"], 404);
    }
}
